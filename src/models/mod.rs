//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod form;
pub mod genre;
pub mod page;
pub mod renewal;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorForm};
pub use book::{Book, BookDetail, BookForm, BookSummary};
pub use book_instance::{BookInstance, BookInstanceFilter, LoanStatus, LoanSummary};
pub use form::{FieldAllowList, FormErrors};
pub use genre::{Genre, Language};
pub use page::{ListConfig, Page, PageQuery, Paginator};
pub use renewal::{RenewBookRequest, RenewalForm};
pub use user::{Capability, UserClaims};
