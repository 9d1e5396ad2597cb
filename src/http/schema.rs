//! OpenAPI description of the REST API, served at `/api/schema/`.
//!
//! Swagger UI and ReDoc pages under `/api/schema/` render it in a browser.

use serde_json::{json, Value};

use super::dto::JSON_API_MEDIA_TYPE;

fn list_parameters(filters: &[&str]) -> Value {
    let mut params: Vec<Value> = filters
        .iter()
        .map(|name| {
            json!({
                "name": format!("filter[{}]", name),
                "in": "query",
                "required": false,
                "schema": { "type": "string" }
            })
        })
        .collect();

    params.push(json!({
        "name": "sort",
        "in": "query",
        "required": false,
        "description": "Comma-separated fields; prefix with '-' for descending order",
        "schema": { "type": "string" }
    }));
    params.push(json!({
        "name": "page[number]",
        "in": "query",
        "required": false,
        "schema": { "type": "integer", "minimum": 1 }
    }));
    params.push(json!({
        "name": "page[size]",
        "in": "query",
        "required": false,
        "schema": { "type": "integer", "minimum": 1, "maximum": 100 }
    }));
    Value::Array(params)
}

fn id_parameter() -> Value {
    json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }])
}

fn document(schema_ref: &str) -> Value {
    json!({ "content": { JSON_API_MEDIA_TYPE: { "schema": { "$ref": schema_ref } } } })
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { JSON_API_MEDIA_TYPE: { "schema": { "$ref": "#/components/schemas/Errors" } } }
    })
}

/// Build the OpenAPI 3 document.
pub fn openapi_document() -> Value {
    let wallet_doc = document("#/components/schemas/WalletDocument");
    let wallet_list = document("#/components/schemas/WalletList");
    let tx_doc = document("#/components/schemas/TransactionDocument");
    let tx_list = document("#/components/schemas/TransactionList");

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "B2B Wallet API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Wallets and transactions with non-negative balances, as JSON:API."
        },
        "paths": {
            "/api/wallets/": {
                "get": {
                    "operationId": "wallets_list",
                    "parameters": list_parameters(&["label", "balance_gt", "balance_lt", "balance_gte", "balance_lte", "search"]),
                    "responses": {
                        "200": merge(json!({ "description": "A page of wallets" }), &wallet_list),
                        "400": error_response("Invalid query parameter"),
                        "404": error_response("Invalid page")
                    }
                },
                "post": {
                    "operationId": "wallets_create",
                    "requestBody": merge(json!({ "required": true }), &wallet_doc),
                    "responses": {
                        "201": merge(json!({ "description": "Created" }), &wallet_doc),
                        "400": error_response("Validation error"),
                        "409": error_response("Resource type mismatch")
                    }
                }
            },
            "/api/wallets/{id}/": {
                "parameters": id_parameter(),
                "get": {
                    "operationId": "wallets_retrieve",
                    "responses": {
                        "200": merge(json!({ "description": "A wallet" }), &wallet_doc),
                        "404": error_response("Not found")
                    }
                },
                "patch": {
                    "operationId": "wallets_partial_update",
                    "requestBody": merge(json!({ "required": true }), &wallet_doc),
                    "responses": {
                        "200": merge(json!({ "description": "Updated" }), &wallet_doc),
                        "400": error_response("Validation error"),
                        "404": error_response("Not found"),
                        "409": error_response("Resource type or id mismatch")
                    }
                },
                "delete": {
                    "operationId": "wallets_destroy",
                    "responses": {
                        "204": { "description": "Deleted together with its transactions" },
                        "404": error_response("Not found")
                    }
                }
            },
            "/api/transactions/": {
                "get": {
                    "operationId": "transactions_list",
                    "parameters": list_parameters(&["wallet", "txid", "amount_gt", "amount_lt", "amount_gte", "amount_lte", "timestamp_gte", "timestamp_lte", "search"]),
                    "responses": {
                        "200": merge(json!({ "description": "A page of transactions" }), &tx_list),
                        "400": error_response("Invalid query parameter"),
                        "404": error_response("Invalid page")
                    }
                },
                "post": {
                    "operationId": "transactions_create",
                    "requestBody": merge(json!({ "required": true }), &tx_doc),
                    "responses": {
                        "201": merge(json!({ "description": "Created" }), &tx_doc),
                        "400": error_response("Validation error or negative balance"),
                        "409": error_response("Resource type mismatch")
                    }
                }
            },
            "/api/transactions/{id}/": {
                "parameters": id_parameter(),
                "get": {
                    "operationId": "transactions_retrieve",
                    "responses": {
                        "200": merge(json!({ "description": "A transaction" }), &tx_doc),
                        "404": error_response("Not found")
                    }
                },
                "delete": {
                    "operationId": "transactions_destroy",
                    "responses": {
                        "204": { "description": "Deleted; the amount is reverted from the wallet" },
                        "400": error_response("Deletion would lead to a negative balance"),
                        "404": error_response("Not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Decimal": {
                    "type": "string",
                    "pattern": "^-?\\d{1,12}(\\.\\d{1,18})?$",
                    "example": "150.000000000000000000"
                },
                "Wallet": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string", "enum": ["Wallet"] },
                        "id": { "type": "string" },
                        "attributes": {
                            "type": "object",
                            "properties": {
                                "label": { "type": "string", "maxLength": 255 },
                                "balance": { "$ref": "#/components/schemas/Decimal", "readOnly": true }
                            }
                        }
                    }
                },
                "Transaction": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string", "enum": ["Transaction"] },
                        "id": { "type": "string" },
                        "attributes": {
                            "type": "object",
                            "properties": {
                                "txid": { "type": "string", "maxLength": 255 },
                                "amount": { "$ref": "#/components/schemas/Decimal" },
                                "timestamp": { "type": "string", "format": "date-time", "readOnly": true }
                            }
                        },
                        "relationships": {
                            "type": "object",
                            "properties": {
                                "wallet": {
                                    "type": "object",
                                    "properties": {
                                        "data": {
                                            "type": "object",
                                            "properties": {
                                                "type": { "type": "string", "enum": ["Wallet"] },
                                                "id": { "type": "string" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "WalletDocument": {
                    "type": "object",
                    "properties": { "data": { "$ref": "#/components/schemas/Wallet" } }
                },
                "TransactionDocument": {
                    "type": "object",
                    "properties": { "data": { "$ref": "#/components/schemas/Transaction" } }
                },
                "WalletList": {
                    "type": "object",
                    "properties": {
                        "data": { "type": "array", "items": { "$ref": "#/components/schemas/Wallet" } },
                        "links": { "$ref": "#/components/schemas/PaginationLinks" },
                        "meta": { "$ref": "#/components/schemas/PaginationMeta" }
                    }
                },
                "TransactionList": {
                    "type": "object",
                    "properties": {
                        "data": { "type": "array", "items": { "$ref": "#/components/schemas/Transaction" } },
                        "links": { "$ref": "#/components/schemas/PaginationLinks" },
                        "meta": { "$ref": "#/components/schemas/PaginationMeta" }
                    }
                },
                "PaginationLinks": {
                    "type": "object",
                    "properties": {
                        "first": { "type": "string" },
                        "last": { "type": "string" },
                        "next": { "type": "string", "nullable": true },
                        "prev": { "type": "string", "nullable": true }
                    }
                },
                "PaginationMeta": {
                    "type": "object",
                    "properties": {
                        "pagination": {
                            "type": "object",
                            "properties": {
                                "page": { "type": "integer" },
                                "pages": { "type": "integer" },
                                "count": { "type": "integer" }
                            }
                        }
                    }
                },
                "Errors": {
                    "type": "object",
                    "properties": {
                        "errors": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "status": { "type": "string" },
                                    "code": { "type": "string" },
                                    "title": { "type": "string" },
                                    "detail": { "type": "string" },
                                    "source": {
                                        "type": "object",
                                        "properties": {
                                            "pointer": { "type": "string" },
                                            "parameter": { "type": "string" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Shallow-merge the keys of `extra` into `base`.
fn merge(mut base: Value, extra: &Value) -> Value {
    if let (Some(target), Some(source)) = (base.as_object_mut(), extra.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
    base
}
