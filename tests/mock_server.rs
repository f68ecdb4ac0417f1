use openapi_mock_bin::http_types::DEFAULT_PROBLEM_TYPE_BASE;
use openapi_mock_bin::{load_openapi_document, FirstChoice, MockRequest, MockResponse, MockServer};
use rstest::{fixture, rstest};
use serde_json::{json, Value};
use std::path::Path;

const ORDER_URL: &str = "http://localhost/pizza/order";

#[fixture]
fn server() -> MockServer<FirstChoice> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/pizza.yaml");
    let document = load_openapi_document(&path).expect("pizza fixture should load");
    MockServer::with_random(document, FirstChoice)
}

fn get(url: &str) -> MockRequest {
    MockRequest::new("GET", url).unwrap()
}

fn post_order(body: Value) -> MockRequest {
    MockRequest::new("POST", ORDER_URL)
        .unwrap()
        .with_body(body.to_string())
}

fn json_body(response: &MockResponse) -> Value {
    serde_json::from_str(&response.body).expect("response body should be JSON")
}

fn errors(response: &MockResponse) -> Vec<String> {
    serde_json::from_value(json_body(response)["errors"].clone()).unwrap_or_default()
}

mod validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn missing_query_parameter_is_reported(server: MockServer<FirstChoice>) {
        let request = get("http://localhost/pizza/order/3")
            .with_header("banana", "123.23")
            .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 400);
        assert_eq!(response.content_type(), Some("application/problem+json"));
        assert_eq!(
            json_body(&response),
            json!({
                "type": format!("{}400", DEFAULT_PROBLEM_TYPE_BASE),
                "title": "Bad Request",
                "status": 400,
                "detail": "Invalid parameters",
                "errors": ["Missing required query parameter 'filter'"]
            })
        );
    }

    #[rstest]
    fn query_parameter_of_wrong_type_is_reported_first(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/pizza/order/3?filter=bob"));

        assert_eq!(response.status, 400);
        let errors = errors(&response);
        assert_eq!(errors[0], "Expected type 'integer' at path 'filter', but got 'string'");
        assert!(errors.contains(&"Missing required header parameter 'banana'".to_string()));
    }

    #[rstest]
    #[case(None, "Missing required header parameter 'banana'")]
    #[case(Some("not-a-number"), "Expected type 'number' at path 'banana', but got 'string'")]
    fn header_parameter_is_checked(
        server: MockServer<FirstChoice>,
        #[case] banana: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut request = get("http://localhost/pizza/order/3?filter=1")
            .with_header("Content-Type", "application/json")
            .unwrap();
        if let Some(banana) = banana {
            request = request.with_header("banana", banana).unwrap();
        }
        let response = server.handle_request(&request);

        assert_eq!(response.status, 400);
        assert_eq!(errors(&response), vec![expected.to_string()]);
    }

    #[rstest]
    fn every_missing_parameter_gets_one_message(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/pizza/order/3"));
        assert_eq!(
            errors(&response),
            vec![
                "Missing required query parameter 'filter'".to_string(),
                "Missing required header parameter 'banana'".to_string(),
            ]
        );
    }

    #[rstest]
    fn missing_body_fields_are_all_reported(server: MockServer<FirstChoice>) {
        let request = post_order(json!({"size": "Medium"}))
            .with_header("Content-Type", "application/json")
            .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 400);
        let body = json_body(&response);
        assert_eq!(body["detail"], json!("Invalid request body"));
        let errors = errors(&response);
        for field in ["customerName", "pizzaType", "deliveryAddress"] {
            assert!(
                errors.contains(&format!("Missing required field '{}'", field)),
                "missing message for {}: {:?}",
                field,
                errors
            );
        }
    }

    #[rstest]
    fn body_fields_of_wrong_type_are_reported(server: MockServer<FirstChoice>) {
        let request = post_order(json!({
            "customerName": "John Doe",
            "pizzaType": 2,
            "size": "Large",
            "toppings": ["Mushrooms", "Olives"],
            "deliveryAddress": "123 Pizza St, Pizzatown"
        }))
        .with_header("Content-Type", "application/json")
        .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 400);
        assert!(errors(&response)
            .contains(&"Expected type 'string' at path 'pizzaType', but got 'number'".to_string()));
    }

    #[rstest]
    fn body_enum_and_nested_values_are_checked(server: MockServer<FirstChoice>) {
        let request = post_order(json!({
            "customerName": "John Doe",
            "pizzaType": "Margherita",
            "size": "Huge",
            "toppings": ["Mushrooms", 4],
            "deliveryAddress": "123 Pizza St, Pizzatown"
        }))
        .with_header("Content-Type", "application/json")
        .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(
            errors(&response),
            vec![
                "Value 'Huge' at path 'size' is not in enum [Small, Medium, Large]".to_string(),
                "Expected type 'string' at path 'toppings[1]', but got 'number'".to_string(),
            ]
        );
    }
}

mod mocking {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn menu_uses_the_named_example(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/pizza/menu"));

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/json"));
        let body = json_body(&response);
        assert_eq!(body["pizzas"][0]["name"], json!("Margherita"));
        assert_eq!(body["pizzas"].as_array().map(Vec::len), Some(2));
    }

    #[rstest]
    fn order_status_with_valid_parameters(server: MockServer<FirstChoice>) {
        let request = get("http://localhost/pizza/order/3?filter=123")
            .with_header("banana", "78")
            .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response)["status"], json!("In the oven"));
    }

    #[rstest]
    fn deep_body_is_generated_from_schema(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/foo"));

        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response), json!({"bar": {"wibble": {"foo": [0]}}}));
    }

    #[rstest]
    #[case(Some("application/json"))]
    #[case(None)]
    fn valid_order_is_created(server: MockServer<FirstChoice>, #[case] content_type: Option<&str>) {
        let mut request = post_order(json!({
            "customerName": "Jane Smith",
            "pizzaType": "Pepperoni",
            "size": "Medium",
            "toppings": ["Peppers", "Onions"],
            "deliveryAddress": "456 Pizza Ave, Pizzaville"
        }));
        if let Some(content_type) = content_type {
            request = request.with_header("Content-Type", content_type).unwrap();
        }
        let response = server.handle_request(&request);

        assert_eq!(response.status, 201);
        assert_eq!(
            json_body(&response),
            json!({"orderId": "abc123", "estimatedDeliveryTime": "45 minutes"})
        );
    }

    #[rstest]
    fn xml_examples_are_served_verbatim(server: MockServer<FirstChoice>) {
        let request = get("http://localhost/xml")
            .with_header("Accept", "application/xml")
            .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/xml"));
        assert!(response.body.starts_with("<note>"));
    }

    #[rstest]
    fn text_examples_are_served_verbatim(server: MockServer<FirstChoice>) {
        let request = get("http://localhost/text").with_header("Accept", "text/plain").unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.body.trim(), "This is a plain text response example.");
    }

    #[rstest]
    #[case(Some("application/json"), "application/json")]
    #[case(Some("application/xml"), "application/xml")]
    #[case(Some("application/*"), "application/json")]
    #[case(Some("*/*"), "application/json")]
    #[case(None, "application/json")]
    fn multi_type_responses_follow_accept(
        server: MockServer<FirstChoice>,
        #[case] accept: Option<&str>,
        #[case] expected: &str,
    ) {
        let mut request = get("http://localhost/multi-type");
        if let Some(accept) = accept {
            request = request.with_header("accept", accept).unwrap();
        }
        let response = server.handle_request(&request);

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some(expected));
        if expected == "application/json" {
            assert_eq!(json_body(&response)["message"], json!("This is a JSON response example."));
        } else {
            assert!(response.body.contains("<response>"));
        }
    }
}

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    fn empty_content_cannot_be_mocked(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/no-mock-available"));

        assert_eq!(response.status, 500);
        assert_eq!(
            json_body(&response)["detail"],
            json!("Unable to Mock. No mockable information found for this path.")
        );
    }

    #[rstest]
    fn operations_without_responses_cannot_be_mocked(server: MockServer<FirstChoice>) {
        let response = server.handle_request(&get("http://localhost/v1/todos"));
        assert_eq!(response.status, 500);
    }

    #[rstest]
    #[case("GET", "http://localhost/nope")]
    #[case("DELETE", "http://localhost/pizza/menu")]
    #[case("GET", "http://localhost/pizza/order")]
    fn unknown_operations_are_not_found(
        server: MockServer<FirstChoice>,
        #[case] method: &str,
        #[case] url: &str,
    ) {
        let request = MockRequest::new(method, url).unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 404);
        assert_eq!(
            json_body(&response)["detail"],
            json!(format!("No matching operation for {} {}", method, url))
        );
    }

    #[rstest]
    fn unacceptable_media_types_list_what_is_available(server: MockServer<FirstChoice>) {
        let request = get("http://localhost/multi-type")
            .with_header("Accept", "image/png")
            .unwrap();
        let response = server.handle_request(&request);

        assert_eq!(response.status, 406);
        assert_eq!(
            json_body(&response)["detail"],
            json!("No acceptable content type. Available: application/json, application/xml")
        );
    }
}
