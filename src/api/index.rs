// src/api/index.rs

use axum::Json;
use serde_json::{json, Value};
use std::sync::OnceLock;

/// Static JSON response for the index endpoint
static INDEX_JSON: OnceLock<Value> = OnceLock::new();

/// Handler for the index endpoint that provides API documentation
///
/// # Endpoint: GET /
///
/// # Returns
/// * `Json<Value>` - JSON response containing API endpoint documentation
pub fn index() -> Json<Value> {
    let value = INDEX_JSON.get_or_init(|| {
        json!({
            "endpoints": [
                {
                    "path": "/",
                    "method": "GET",
                    "description": "API endpoint documentation",
                    "params": {}
                },
                {
                    "path": "/pan-kyc/upload",
                    "method": "POST",
                    "description": "Upload a PAN KYC spreadsheet (.xlsx or .csv) and create a batch of verification records",
                    "params": {
                        "file": {
                            "type": "file",
                            "required": true,
                            "description": "Multipart file field; first row is the header row (name, pan, aadhaar, email, phone, dob)"
                        }
                    }
                },
                {
                    "path": "/aadhaar-pan/upload",
                    "method": "POST",
                    "description": "Upload an Aadhaar-PAN link check spreadsheet; requires both aadhaar and pan columns",
                    "params": {
                        "file": {
                            "type": "file",
                            "required": true,
                            "description": "Multipart file field"
                        }
                    }
                },
                {
                    "path": "/pan-kyc/verify",
                    "method": "POST",
                    "description": "Verify a batch's pending and failed records against the provider in the background",
                    "params": {
                        "batch_id": {
                            "type": "string",
                            "required": true,
                            "description": "Batch to verify"
                        },
                        "record_ids": {
                            "type": "array",
                            "items": "string",
                            "required": false,
                            "description": "Restrict verification to these records of the batch"
                        }
                    }
                },
                {
                    "path": "/aadhaar-pan/verify",
                    "method": "POST",
                    "description": "Check Aadhaar-PAN link status for a batch's records",
                    "params": {
                        "$ref": "#/endpoints/3/params"
                    }
                },
                {
                    "path": "/aadhaar-verification/generate-otp",
                    "method": "POST",
                    "description": "Request an Aadhaar e-KYC OTP for a single holder",
                    "params": {
                        "aadhaar_number": {
                            "type": "string",
                            "required": true,
                            "description": "12-digit Aadhaar number"
                        }
                    }
                },
                {
                    "path": "/aadhaar-verification/verify-single",
                    "method": "POST",
                    "description": "Complete Aadhaar e-KYC with the OTP received by the holder",
                    "params": {
                        "reference_id": {
                            "type": "string",
                            "required": true,
                            "description": "Reference id returned by generate-otp"
                        },
                        "otp": {
                            "type": "string",
                            "required": true,
                            "description": "OTP received on the registered mobile number"
                        }
                    }
                },
                {
                    "path": "/pan-kyc/batches",
                    "method": "GET",
                    "description": "Paginated batch list with aggregated record counts",
                    "params": {
                        "page": {
                            "type": "integer",
                            "required": false,
                            "description": "Page number (starting from 1)"
                        },
                        "search": {
                            "type": "string",
                            "required": false,
                            "description": "Filter batches by file name"
                        }
                    }
                },
                {
                    "path": "/pan-kyc/batches/:batch_id",
                    "method": "GET",
                    "description": "Batch summary with its records, paginated and searchable",
                    "params": {
                        "page": {
                            "type": "integer",
                            "required": false,
                            "description": "Page number (starting from 1)"
                        },
                        "search": {
                            "type": "string",
                            "required": false,
                            "description": "Filter records by holder name, PAN or Aadhaar number"
                        }
                    }
                },
                {
                    "path": "/pan-kyc/batches/:batch_id",
                    "method": "DELETE",
                    "description": "Delete a batch with its records and provider log trail (requires AUTHORIZATION header)",
                    "params": {}
                },
                {
                    "path": "/pan-kyc/records/:record_id",
                    "method": "GET",
                    "description": "One record with its provider log trail",
                    "params": {}
                },
                {
                    "path": "/health",
                    "method": "GET",
                    "description": "Liveness and background job health",
                    "params": {}
                },
            ]
        })
    });

    Json(value.clone())
}
