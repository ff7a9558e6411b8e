//! OpenAPI 3.x and Swagger 2.0 parsers
//!
//! Both generations are read into the same lenient `SpecRoot` and walked
//! path × method into canonical endpoints. Local `$ref`s to parameters,
//! request bodies, responses and schemas are resolved along the way.
//!
//! ## Usage
//! ```rust,ignore
//! use apidoc_mcp_parser::openapi::OpenApiParser;
//!
//! let description = OpenApiParser::from_content(&content)?.parse()?;
//! ```

mod endpoints;
mod parser;
mod types;

pub use parser::{OpenApiParser, SwaggerParser};
pub use types::SpecRoot;
