// src/api_tests.rs

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::server::{build_router, AppState};
    use crate::store::WorkOrderStore;

    fn test_app() -> Router {
        build_router(AppState {
            store: WorkOrderStore::new(),
            config: Arc::new(Config {
                server_host: "127.0.0.1".to_string(),
                server_port: 0,
                seed_data_path: None,
                window_days: 7,
            }),
        })
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(req)
            .await
            .expect("request should complete");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should collect")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, value)
    }

    /// Money fields travel as strings on the wire.
    fn dec_of(value: &Value) -> Decimal {
        value
            .as_str()
            .expect("decimal field should be a string")
            .parse()
            .expect("decimal field should parse")
    }

    async fn paste(app: &Router, text: &str) -> (StatusCode, Value) {
        send(app, json_request("POST", "/api/orders/paste", json!({ "text": text }))).await
    }

    #[tokio::test]
    async fn health_reports_order_count() {
        let app = test_app();
        let (status, body) = send(&app, request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["orders"], 0);
    }

    #[tokio::test]
    async fn paste_accepts_rows_and_prepends_later_batches() {
        let app = test_app();
        let (status, body) = paste(
            &app,
            "CAMBIO RODAMIENTOS\t1500\tOPEX\tMECANICO\tPREVENTIVO\t22/06/2026\tT2\t24/06/2026\tT1\nLIMPIEZA FOSA\t800\tAPI\tSERVICIOS\tCORRECTIVO",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["skipped"], 0);
        assert_eq!(body["total"], 2);

        let (status, _) = paste(&app, "PINTURA NAVE-300-OPEX-PATIO-MEJORA").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, request("GET", "/api/orders")).await;
        assert_eq!(status, StatusCode::OK);
        let activities: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|order| order["activity"].as_str().unwrap())
            .collect();
        assert_eq!(
            activities,
            vec!["PINTURA NAVE", "CAMBIO RODAMIENTOS", "LIMPIEZA FOSA"]
        );
    }

    #[tokio::test]
    async fn paste_expands_schedules_on_the_wire() {
        let app = test_app();
        paste(
            &app,
            "CAMBIO RODAMIENTOS\t1500\tOPEX\tMECANICO\tPREVENTIVO\t22/06/2026\tT2\t24/06/2026\tT1",
        )
        .await;
        let (_, body) = send(&app, request("GET", "/api/orders")).await;
        let schedule = &body[0]["schedule"];
        assert_eq!(schedule["2026-06-22"], json!(["T2", "T3"]));
        assert_eq!(schedule["2026-06-23"], json!(["T1", "T2", "T3"]));
        assert_eq!(schedule["2026-06-24"], json!(["T1"]));
    }

    #[tokio::test]
    async fn paste_of_blank_lines_is_nothing_imported() {
        let app = test_app();
        let (status, body) = paste(&app, "\n\n   \n").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["accepted"], 0);
        assert!(body["skipped"].as_u64().unwrap() > 0);
        assert!(body["error"].as_str().unwrap().contains("No rows"));

        let (status, _) = paste(&app, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn manual_add_applies_form_defaults() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/orders",
                json!({
                    "activity": "ENGRASE GENERAL",
                    "amount": 250,
                    "startDate": "22/06/2026",
                    "startShift": "T3",
                    "endDate": "22/06/2026",
                    "endShift": "T1",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["workType"], "PREVENTIVO");
        assert_eq!(body["category"], "OPEX");
        assert_eq!(body["owner"], "");
        // Inverted shifts on a single day swap into a full-day slice.
        assert_eq!(body["schedule"]["2026-06-22"], json!(["T1", "T2", "T3"]));

        let (_, metrics) = send(&app, request("GET", "/api/metrics")).await;
        assert_eq!(dec_of(&metrics["sumByOwner"]["SIN ASIGNAR"]), dec!(250));
    }

    #[tokio::test]
    async fn manual_add_rejects_blank_activity_and_bad_dates() {
        let app = test_app();
        let (status, _) = send(
            &app,
            json_request("POST", "/api/orders", json!({ "activity": "   ", "amount": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/orders",
                json!({ "activity": "PRUEBA", "amount": 10, "startDate": "junio 22" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("junio 22"));
    }

    #[tokio::test]
    async fn delete_then_missing_then_clear() {
        let app = test_app();
        paste(&app, "UNO\t100\nDOS\t200").await;
        let (_, orders) = send(&app, request("GET", "/api/orders")).await;
        let id = orders[0]["id"].as_u64().unwrap();

        let (status, _) = send(&app, request("DELETE", &format!("/api/orders/{}", id))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, request("DELETE", &format!("/api/orders/{}", id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, body) = send(&app, request("DELETE", "/api/orders")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 1);
        let (_, body) = send(&app, request("GET", "/api/orders")).await;
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn grid_import_replaces_the_collection() {
        let app = test_app();
        paste(&app, "VIEJO\t100").await;
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/orders/import",
                json!({
                    "rows": [
                        ["", "ACTIVIDAD", "MONTO", "CONCEPTO", "RESPONSABLE", "TIPO"],
                        ["", "OBRA CIVIL", 56210, "", "CONTRATISTA", "PREVENTIVO", "", "", "",
                         "MTTO CALDERA", "7000", "", "SERVICIOS", "CORRECTIVO"],
                    ],
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["total"], 2);

        let (_, orders) = send(&app, request("GET", "/api/orders")).await;
        let activities: Vec<&str> = orders
            .as_array()
            .unwrap()
            .iter()
            .map(|order| order["activity"].as_str().unwrap())
            .collect();
        assert_eq!(activities, vec!["OBRA CIVIL", "MTTO CALDERA"]);
        assert_eq!(orders[0]["category"], "OPEX");
        assert_eq!(orders[1]["category"], "API");
    }

    #[tokio::test]
    async fn csv_import_uses_the_grid_layout() {
        let app = test_app();
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/orders/import-csv",
                json!({ "text": ",ACTIVIDAD,MONTO,CONCEPTO,RESPONSABLE,TIPO\n,REPARACION PORTON,12500,,TALLER,CORRECTIVO\n" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 1);
        let (_, orders) = send(&app, request("GET", "/api/orders")).await;
        assert_eq!(orders[0]["activity"], "REPARACION PORTON");
        assert_eq!(dec_of(&orders[0]["amount"]), dec!(12500));
    }

    #[tokio::test]
    async fn metrics_totals_rankings_and_share() {
        let app = test_app();
        paste(
            &app,
            "CAMBIO RODAMIENTOS\t1500\tOPEX\tMECANICO\tPREVENTIVO\nLIMPIEZA FOSA\t800\tAPI\tSERVICIOS\tCORRECTIVO\nPINTURA NAVE\t300\tOPEX\tPATIO\tMEJORA",
        )
        .await;
        let (status, body) = send(&app, request("GET", "/api/metrics")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dec_of(&body["totalAmount"]), dec!(2600));
        assert_eq!(dec_of(&body["sumByCategory"]["OPEX"]), dec!(1800));
        assert_eq!(dec_of(&body["sumByCategory"]["API"]), dec!(800));
        // 1500 of 2600 is preventive.
        assert_eq!(dec_of(&body["preventiveShare"]), dec!(57.7));

        let ranking = body["ownerRanking"].as_array().unwrap();
        assert_eq!(ranking[0]["owner"], "MECANICO");
        assert_eq!(ranking[2]["owner"], "PATIO");

        let opex = body["rankedOpex"].as_array().unwrap();
        assert_eq!(opex[0]["activity"], "CAMBIO RODAMIENTOS");
        assert_eq!(opex[1]["activity"], "PINTURA NAVE");
        assert_eq!(body["rankedApi"][0]["activity"], "LIMPIEZA FOSA");

        let colors = body["ownerColors"].as_object().unwrap();
        assert_eq!(colors.len(), 3);
        assert_eq!(colors["MECANICO"], "#1e40af");
    }

    #[tokio::test]
    async fn metrics_owner_filter_is_case_insensitive() {
        let app = test_app();
        paste(&app, "A\t100\tOPEX\tMECANICO\tPREVENTIVO\nB\t50\tOPEX\tPATIO\t").await;
        let (_, body) = send(&app, request("GET", "/api/metrics?owner=mecanico")).await;
        assert_eq!(dec_of(&body["totalAmount"]), dec!(100));
        assert_eq!(body["ownerRanking"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn schedule_board_windows_and_filters() {
        let app = test_app();
        paste(
            &app,
            "A\t100\tOPEX\tZONA SUR\tPREVENTIVO\nB\t50\tOPEX\tALMACEN\tPREVENTIVO",
        )
        .await;
        let (status, body) = send(
            &app,
            request("GET", "/api/schedule?pivot=2026-06-29&days=7"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let window = body["window"].as_array().unwrap();
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], "2026-06-29");
        assert_eq!(window[6], "2026-07-05");
        // Rows come back sorted by owner.
        assert_eq!(body["rows"][0]["owner"], "ALMACEN");
        assert_eq!(body["rows"][1]["owner"], "ZONA SUR");

        let (_, body) = send(
            &app,
            request("GET", "/api/schedule?pivot=22/06/2026&days=99&owner=almacen"),
        )
        .await;
        let window = body["window"].as_array().unwrap();
        assert_eq!(window.len(), 31);
        assert_eq!(window[0], "2026-06-22");
        assert_eq!(body["rows"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, request("GET", "/api/schedule?pivot=manana")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn schedule_board_navigates_weeks_and_months() {
        let app = test_app();
        let (_, body) = send(&app, request("GET", "/api/schedule?pivot=2026-06-29&nav=next")).await;
        assert_eq!(body["window"][0], "2026-07-06");

        let (_, body) = send(&app, request("GET", "/api/schedule?pivot=2026-06-29&nav=prev")).await;
        assert_eq!(body["window"][0], "2026-06-22");

        let (_, body) = send(&app, request("GET", "/api/schedule?pivot=2026-06-29&month=11")).await;
        assert_eq!(body["window"][0], "2026-11-01");
    }

    #[tokio::test]
    async fn schedule_board_defaults_to_configured_window() {
        let app = test_app();
        let (status, body) = send(&app, request("GET", "/api/schedule?pivot=2026-01-01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["window"].as_array().unwrap().len(), 7);
        assert_eq!(body["rows"].as_array().unwrap().len(), 0);
    }
}
