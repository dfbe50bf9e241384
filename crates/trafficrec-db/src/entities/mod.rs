//! Database entities

pub mod field_values;
pub mod header;
pub mod request;
pub mod response;
pub mod response_cookie;
pub mod response_header;
pub mod response_trailer;
pub mod run;
pub mod trailer;

pub use field_values::FieldValues;
pub use header::Entity as Header;
pub use request::Entity as Request;
pub use response::Entity as Response;
pub use response_cookie::Entity as ResponseCookie;
pub use response_header::Entity as ResponseHeader;
pub use response_trailer::Entity as ResponseTrailer;
pub use run::Entity as Run;
pub use trailer::Entity as Trailer;

pub mod prelude {
    pub use super::header::Entity as Header;
    pub use super::request::Entity as Request;
    pub use super::response::Entity as Response;
    pub use super::response_cookie::Entity as ResponseCookie;
    pub use super::response_header::Entity as ResponseHeader;
    pub use super::response_trailer::Entity as ResponseTrailer;
    pub use super::run::Entity as Run;
    pub use super::trailer::Entity as Trailer;
}
