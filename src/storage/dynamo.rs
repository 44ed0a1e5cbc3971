// DynamoDB table store

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

use super::TableStore;
use crate::models::{AttrValue, Item};

pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    /// Build a client for `region`; credentials come from the default chain
    pub async fn connect(region: &str) -> Self {
        let conf = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&conf),
        }
    }
}

fn to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| {
            let value = match v {
                AttrValue::S(s) => AttributeValue::S(s.clone()),
                AttrValue::N(n) => AttributeValue::N(n.to_string()),
            };
            (k.clone(), value)
        })
        .collect()
}

impl TableStore for DynamoStore {
    async fn put(&self, table: &str, item: &Item) -> Result<(), String> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_attributes(item)))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| DisplayErrorContext(&e).to_string())
    }

    async fn delete_table(&self, table: &str) -> Result<(), String> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| DisplayErrorContext(&e).to_string())
    }
}
