//! End-to-end API test: boot the router over the in-memory store and walk
//! a shop's workflow through real HTTP.

mod common;

use common::entity_store;
use serde_json::json;
use stitchdesk::app::order_service::OrderService;
use stitchdesk::transport;

async fn envelope(
    request: reqwest::RequestBuilder,
) -> Result<(reqwest::StatusCode, serde_json::Value), Box<dyn std::error::Error>> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.json::<serde_json::Value>().await?;
    Ok((status, body))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shop_workflow_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let entities = entity_store().await;
    let app_state = transport::http::AppState {
        entities: entities.clone(),
        orders: OrderService::new(entities),
    };
    let router = transport::http::create_router(app_state);

    // Bind to an ephemeral port to avoid conflicts if an API server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(resp.status(), 200);

    // Every /api route requires the bearer credential.
    let resp = client
        .get(format!("{}/api/customers", base_url))
        .send()
        .await?;
    assert_eq!(resp.status(), 401);

    println!("--- Phase 1: catalog and customer setup ---");

    let (status, body) = envelope(
        client
            .post(format!("{}/api/services", base_url))
            .bearer_auth("shop-1")
            .json(&json!({
                "record": {
                    "name": "Shirt",
                    "description": "Formal shirt",
                    "price": 500,
                    "estimated_days": 5
                }
            })),
    )
    .await?;
    assert_eq!(status, 200);
    assert!(body["success"].as_bool().unwrap_or(false));
    let service_id = body["data"]["service_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["price"], "500");
    assert_eq!(body["data"]["shop_id"], "shop-1");

    let (status, body) = envelope(
        client
            .post(format!("{}/api/customers", base_url))
            .bearer_auth("shop-1")
            .json(&json!({
                "record": {
                    "full_name": "Anil Kumar",
                    "phone": "9000000000",
                    "gender": "male",
                    "tags": ["regular"]
                }
            })),
    )
    .await?;
    assert_eq!(status, 200);
    let customer_id = body["data"]["customer_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["shop_id"], json!(["shop-1"]));

    // Listings and lookups are tenant-scoped.
    let (_, body) = envelope(
        client
            .get(format!("{}/api/customers", base_url))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = envelope(
        client
            .get(format!("{}/api/customers", base_url))
            .bearer_auth("shop-2"),
    )
    .await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, body) = envelope(
        client
            .get(format!("{}/api/customers/{}", base_url, customer_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["full_name"], "Anil Kumar");
    let (status, _) = envelope(
        client
            .get(format!("{}/api/customers/{}", base_url, customer_id))
            .bearer_auth("shop-2"),
    )
    .await?;
    assert_eq!(status, 404);

    // Bad requests keep their typed statuses.
    let (status, _) = envelope(
        client
            .get(format!("{}/api/invoices", base_url))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 400);
    let (status, body) = envelope(
        client
            .post(format!("{}/api/customers", base_url))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "nickname": "A" } })),
    )
    .await?;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("nickname"));

    // Corrections merge into the stored row; the read token guards them.
    let (_, body) = envelope(
        client
            .get(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    let read_token = body["data"]["updated_at"].as_str().unwrap().to_string();

    let (status, body) = envelope(
        client
            .put(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "price": 550, "updated_at": read_token } })),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["price"], "550");
    assert_eq!(body["data"]["name"], "Shirt");
    assert_ne!(body["data"]["updated_at"], read_token.as_str());

    // The pre-update token is now stale.
    let (status, body) = envelope(
        client
            .put(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "price": 600, "updated_at": read_token } })),
    )
    .await?;
    assert_eq!(status, 409);
    assert!(!body["success"].as_bool().unwrap_or(true));

    let (status, _) = envelope(
        client
            .put(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-2")
            .json(&json!({ "record": { "price": 1 } })),
    )
    .await?;
    assert_eq!(status, 404);

    let (status, body) = envelope(
        client
            .put(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "margin": 99 } })),
    )
    .await?;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("margin"));

    // Failed attempts left the correction in place.
    let (_, body) = envelope(
        client
            .get(format!("{}/api/services/{}", base_url, service_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(body["data"]["price"], "550");

    // Omitted columns keep their stored values.
    let (status, body) = envelope(
        client
            .put(format!("{}/api/customers/{}", base_url, customer_id))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "phone": "9111111111" } })),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["phone"], "9111111111");
    assert_eq!(body["data"]["full_name"], "Anil Kumar");
    assert_eq!(body["data"]["shop_id"], json!(["shop-1"]));

    println!("--- Phase 2: order lifecycle ---");

    let (status, body) = envelope(
        client
            .post(format!("{}/api/orders", base_url))
            .bearer_auth("shop-1")
            .json(&json!({
                "customer_id": customer_id,
                "total_price": 500,
                "discount": 50,
                "urgent": true,
                "items": [{
                    "service_id": service_id,
                    "measurement_data": {
                        "chest": { "value": "38" },
                        "waist": "34"
                    }
                }]
            })),
    )
    .await?;
    assert_eq!(status, 200);
    assert!(body["success"].as_bool().unwrap_or(false));
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "received");
    assert_eq!(body["data"]["payment_status"], "unpaid");
    assert_eq!(body["data"]["due_amount"], "450");
    assert_eq!(body["data"]["measurement_refs"].as_array().unwrap().len(), 1);

    let (_, body) = envelope(
        client
            .get(format!("{}/api/orders", base_url))
            .bearer_auth("shop-1"),
    )
    .await?;
    let listing = body["data"].as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["customer"], "Anil Kumar");

    let (status, body) = envelope(
        client
            .get(format!("{}/api/orders/{}/detail", base_url, order_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["customer"]["full_name"], "Anil Kumar");
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["fields"]["chest"], "38");
    assert_eq!(items[0]["fields"]["waist"], "34");
    assert_eq!(items[0]["service_name"], "Shirt");
    assert_eq!(items[0]["quantity"], 1);

    println!("--- Phase 3: status and payment transitions ---");

    for want in ["cutting", "stitching", "ready", "delivered"] {
        let (status, body) = envelope(
            client
                .patch(format!("{}/api/orders/{}/status", base_url, order_id))
                .bearer_auth("shop-1"),
        )
        .await?;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["status"], want);
    }
    let (status, body) = envelope(
        client
            .patch(format!("{}/api/orders/{}/status", base_url, order_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 422);
    assert!(!body["success"].as_bool().unwrap_or(true));

    let (_, body) = envelope(
        client
            .get(format!("{}/api/orders/{}/detail", base_url, order_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert!(!body["data"]["order"]["delivered_date"]
        .as_str()
        .unwrap()
        .is_empty());

    let (status, body) = envelope(
        client
            .patch(format!("{}/api/orders/{}/payment", base_url, order_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["payment_status"], "paid");
    assert_eq!(body["data"]["due_amount"], "0");
    let (status, _) = envelope(
        client
            .patch(format!("{}/api/orders/{}/payment", base_url, order_id))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 422);

    println!("--- Phase 4: failure shapes ---");

    // Another tenant cannot even see the order, let alone move it.
    let (status, _) = envelope(
        client
            .patch(format!("{}/api/orders/{}/status", base_url, order_id))
            .bearer_auth("shop-2"),
    )
    .await?;
    assert_eq!(status, 404);

    let (status, _) = envelope(
        client
            .get(format!("{}/api/orders/NOPE/detail", base_url))
            .bearer_auth("shop-1"),
    )
    .await?;
    assert_eq!(status, 404);

    // Orders take no whole-row edits; status and payment own mutation.
    let (status, body) = envelope(
        client
            .put(format!("{}/api/orders/{}", base_url, order_id))
            .bearer_auth("shop-1")
            .json(&json!({ "record": { "notes": "override" } })),
    )
    .await?;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("status"));

    // Body that does not deserialize -> 422 with the expected shape named.
    let (status, body) = envelope(
        client
            .post(format!("{}/api/orders", base_url))
            .bearer_auth("shop-1")
            .json(&json!({ "customer_id": 7 })),
    )
    .await?;
    assert_eq!(status, 422);
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON body"));

    // Order without items is rejected before anything is written.
    let (status, _) = envelope(
        client
            .post(format!("{}/api/orders", base_url))
            .bearer_auth("shop-1")
            .json(&json!({
                "customer_id": customer_id,
                "total_price": 100,
                "items": []
            })),
    )
    .await?;
    assert_eq!(status, 400);

    server_handle.abort();
    Ok(())
}
