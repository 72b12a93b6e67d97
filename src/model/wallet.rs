use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A customer's prepaid balance, in integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub customer_id: ObjectId,
    pub balance: i64,
}
