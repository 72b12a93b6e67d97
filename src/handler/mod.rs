pub mod customer_handler;
pub mod technician_handler;

use crate::util::error::HandlerError;
use bson::oid::ObjectId;

/// Path and claim ids arrive as ObjectId hex strings.
pub(crate) fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw).map_err(|_| HandlerError::bad_request(format!("Invalid {}", what)))
}
