pub mod body_limit;
pub mod request_id;
