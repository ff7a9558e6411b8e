//! Integration tests for the OpenAPI 3.x and Swagger 2.0 parsers

use apidoc_mcp_common::{BridgeError, HttpMethod, ParameterLocation, Server};
use apidoc_mcp_parser::{OpenApiParser, SwaggerParser};

#[test]
fn test_parse_petstore_openapi() {
    let openapi_json = r##"{
        "openapi": "3.0.0",
        "info": {
            "title": "Petstore",
            "version": "1.2.0",
            "description": "Sample pet store"
        },
        "paths": {
            "/pets/{petId}": {
                "parameters": [
                    {"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}}
                ],
                "get": {
                    "operationId": "showPetById",
                    "summary": "Info for a specific pet",
                    "parameters": [
                        {"$ref": "#/components/parameters/Verbose"},
                        {"name": "session", "in": "cookie", "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "200": {
                            "description": "Expected response",
                            "content": {
                                "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                            }
                        },
                        "404": {"description": "Not found"}
                    }
                },
                "delete": {
                    "responses": {"204": {"description": "Deleted"}}
                }
            },
            "/pets": {
                "post": {
                    "operationId": "createPet",
                    "requestBody": {"$ref": "#/components/requestBodies/NewPet"},
                    "responses": {"201": {"description": "Created"}}
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "integer", "format": "int64"},
                        "name": {"type": "string"}
                    }
                }
            },
            "parameters": {
                "Verbose": {"name": "verbose", "in": "query", "schema": {"type": "boolean"}}
            },
            "requestBodies": {
                "NewPet": {
                    "required": true,
                    "content": {
                        "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                    }
                }
            }
        }
    }"##;

    let api = OpenApiParser::from_content(openapi_json)
        .expect("Failed to load OpenAPI spec")
        .parse()
        .expect("Failed to parse OpenAPI spec");

    assert_eq!(api.title, "Petstore");
    assert_eq!(api.version, "1.2.0");
    assert_eq!(api.endpoints.len(), 3);

    // Document order: path items, then methods within each item
    let order: Vec<(Option<HttpMethod>, &str)> = api
        .endpoints
        .iter()
        .map(|e| (e.method, e.path.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (Some(HttpMethod::Get), "/pets/{petId}"),
            (Some(HttpMethod::Delete), "/pets/{petId}"),
            (Some(HttpMethod::Post), "/pets"),
        ]
    );

    let get = &api.endpoints[0];
    assert_eq!(get.operation_id.as_deref(), Some("showPetById"));
    let names: Vec<&str> = get.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["petId", "verbose"], "cookie parameters are dropped");
    assert_eq!(get.parameters[0].location, ParameterLocation::Path);
    assert!(get.parameters[0].required);
    assert_eq!(get.parameters[1].schema.schema_type(), Some("boolean"));

    let ok = &get.responses[0];
    assert_eq!(ok.status_code, "200");
    assert_eq!(ok.content_type.as_deref(), Some("application/json"));
    assert_eq!(ok.schema.schema_type(), Some("object"));
    assert_eq!(get.responses[1].status_code, "404");

    // Path-level parameters apply to every method of the item
    let delete = &api.endpoints[1];
    assert_eq!(delete.declared_path_parameters(), vec!["petId"]);
    assert!(delete.operation_id.is_none());

    let post = &api.endpoints[2];
    let body = post.request_body.as_ref().expect("request body");
    assert!(body.required);
    assert_eq!(body.content_type, "application/json");
    assert_eq!(body.schema.required_properties(), vec!["id", "name"]);
}

#[test]
fn test_parse_openapi_yaml_with_numeric_keys() {
    let yaml = r#"
openapi: 3.0.3
info:
  title: Weather
  version: 2
paths:
  /forecast:
    get:
      parameters:
        - name: city
          in: query
          required: true
          schema:
            type: string
      responses:
        200:
          description: Forecast
"#;

    let api = OpenApiParser::from_content(yaml).unwrap().parse().unwrap();
    assert_eq!(api.version, "2");
    assert_eq!(api.endpoints[0].responses[0].status_code, "200");
    assert!(api.endpoints[0].parameters[0].required);
}

#[test]
fn test_openapi_requires_version_key() {
    let result = OpenApiParser::from_content(r#"{"info": {"title": "x"}, "paths": {}}"#);
    assert!(matches!(result, Err(BridgeError::Parse(_))));

    let result = OpenApiParser::from_content(r#"{"swagger": "2.0", "paths": {}}"#);
    assert!(matches!(result, Err(BridgeError::Parse(_))));

    let result = OpenApiParser::from_content("not: [valid");
    assert!(matches!(result, Err(BridgeError::Parse(_))));
}

#[test]
fn test_parse_swagger_body_and_form_parameters() {
    let swagger_json = r##"{
        "swagger": "2.0",
        "info": {"title": "Users", "version": "1.0"},
        "consumes": ["application/json"],
        "produces": ["application/json"],
        "paths": {
            "/users/{id}": {
                "put": {
                    "operationId": "updateUser",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "type": "string"},
                        {"name": "X-Trace", "in": "header", "type": "string"},
                        {"name": "user", "in": "body", "required": true, "schema": {"$ref": "#/definitions/User"}}
                    ],
                    "responses": {
                        "200": {"description": "ok", "schema": {"$ref": "#/definitions/User"}}
                    }
                }
            },
            "/avatars": {
                "post": {
                    "consumes": ["multipart/form-data"],
                    "parameters": [
                        {"name": "file", "in": "formData", "type": "file", "required": true},
                        {"name": "caption", "in": "formData", "type": "string", "description": "Alt text"}
                    ],
                    "responses": {"201": {"description": "stored"}}
                }
            }
        },
        "definitions": {
            "User": {
                "type": "object",
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
            }
        }
    }"##;

    let api = SwaggerParser::from_content(swagger_json)
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(api.endpoints.len(), 2);

    let put = &api.endpoints[0];
    let locations: Vec<ParameterLocation> = put.parameters.iter().map(|p| p.location).collect();
    assert_eq!(locations, vec![ParameterLocation::Path, ParameterLocation::Header]);
    let body = put.request_body.as_ref().unwrap();
    assert!(body.required);
    assert_eq!(body.content_type, "application/json");
    let props: Vec<String> = body.schema.properties().into_iter().map(|(n, _)| n).collect();
    assert_eq!(props, vec!["name", "age"]);
    assert_eq!(put.responses[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(put.responses[0].schema.schema_type(), Some("object"));

    let upload = &api.endpoints[1];
    assert!(upload.parameters.is_empty());
    let form = upload.request_body.as_ref().unwrap();
    assert_eq!(form.content_type, "multipart/form-data");
    assert_eq!(form.schema.required_properties(), vec!["file"]);
    let caption = &form.schema.properties()[1].1;
    assert_eq!(caption.description(), Some("Alt text"));
}

#[test]
fn test_swagger_numeric_version_in_yaml() {
    let yaml = "swagger: 2.0\ninfo:\n  title: T\n  version: '1'\npaths: {}\n";
    let api = SwaggerParser::from_content(yaml).unwrap().parse().unwrap();
    assert_eq!(api.title, "T");
    assert!(api.endpoints.is_empty());
}

#[test]
fn test_openapi_servers_are_kept() {
    let openapi_yaml = r#"
openapi: 3.0.1
info:
  title: Hooks
  version: "1"
servers:
  - url: https://hooks.example.com/api
    description: production
  - url: http://localhost:8080
paths: {}
"#;

    let api = OpenApiParser::from_content(openapi_yaml)
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(
        api.servers,
        vec![
            Server {
                url: "https://hooks.example.com/api".to_string(),
                description: "production".to_string(),
            },
            Server::new("http://localhost:8080"),
        ]
    );
}

#[test]
fn test_swagger_servers_from_host_and_schemes() {
    let with_schemes = r#"{
        "swagger": "2.0",
        "info": {"title": "Pets", "version": "1.0"},
        "host": "pets.example.com:8443",
        "basePath": "/v1",
        "schemes": ["https", "http"],
        "paths": {}
    }"#;
    let api = SwaggerParser::from_content(with_schemes)
        .unwrap()
        .parse()
        .unwrap();
    let urls: Vec<&str> = api.servers.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://pets.example.com:8443/v1", "http://pets.example.com:8443/v1"]
    );

    let host_only = r#"{"swagger": "2.0", "info": {"title": "Pets", "version": "1.0"},
                       "host": "pets.example.com", "paths": {}}"#;
    let api = SwaggerParser::from_content(host_only).unwrap().parse().unwrap();
    assert_eq!(api.servers, vec![Server::new("https://pets.example.com")]);

    let no_host = r#"{"swagger": "2.0", "info": {"title": "Pets", "version": "1.0"}, "paths": {}}"#;
    let api = SwaggerParser::from_content(no_host).unwrap().parse().unwrap();
    assert!(api.servers.is_empty());
}
