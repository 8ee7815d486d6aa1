//! Declarative configuration of the list and edit views.
//!
//! Each handler is parameterized by one of these constants instead of
//! inheriting defaults: which records, in what order, how many per page,
//! which fields clients may write and who may do it.

use crate::models::{Capability, FieldAllowList, ListConfig};
use crate::models::{author, book};

pub const BOOK_LIST: ListConfig = ListConfig {
    name: "book_list",
    page_size: 5,
    ordering: "b.title, b.id",
};

pub const AUTHOR_LIST: ListConfig = ListConfig {
    name: "author_list",
    page_size: 10,
    ordering: "a.last_name, a.first_name, a.id",
};

/// Copies on loan to the caller
pub const LOANED_BY_USER: ListConfig = ListConfig {
    name: "bookinstance_list_borrowed_user",
    page_size: 10,
    ordering: "bi.due_back, bi.id",
};

/// Every copy on loan, staff only
pub const ALL_BORROWED: ListConfig = ListConfig {
    name: "bookinstance_list_borrowed_all",
    page_size: 10,
    ordering: "bi.due_back, bi.id",
};

/// Capability required by every catalog write and the staff loan views
pub const STAFF: Capability = Capability::CanMarkReturned;

/// Create or update view description
#[derive(Debug, Clone, Copy)]
pub struct EditConfig {
    pub name: &'static str,
    pub fields: FieldAllowList,
    /// Every field the model lets clients write
    pub editable: &'static [&'static str],
    /// Pre-filled values shown by the create form
    pub initial: &'static [(&'static str, &'static str)],
    pub permission: Capability,
}

impl EditConfig {
    pub fn permitted_fields(&self) -> Vec<&'static str> {
        self.fields.resolve(self.editable)
    }
}

/// Delete view description
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfig {
    pub name: &'static str,
    pub permission: Capability,
    /// Where the client is sent once the record is gone
    pub success_url: &'static str,
}

pub const AUTHOR_CREATE: EditConfig = EditConfig {
    name: "author_form",
    fields: FieldAllowList::Only(&["first_name", "last_name", "date_of_birth", "date_of_death"]),
    editable: author::EDITABLE_FIELDS,
    initial: &[("date_of_birth", "2020-11-06")],
    permission: STAFF,
};

pub const AUTHOR_UPDATE: EditConfig = EditConfig {
    name: "author_form",
    fields: FieldAllowList::All,
    editable: author::EDITABLE_FIELDS,
    initial: &[],
    permission: STAFF,
};

pub const AUTHOR_DELETE: DeleteConfig = DeleteConfig {
    name: "author_confirm_delete",
    permission: STAFF,
    success_url: "/api/v1/catalog/authors",
};

pub const BOOK_CREATE: EditConfig = EditConfig {
    name: "book_form",
    fields: FieldAllowList::Only(&["title", "author", "summary", "isbn", "genre", "language"]),
    editable: book::EDITABLE_FIELDS,
    // resolved to the id of the language with this name
    initial: &[("language", "English")],
    permission: STAFF,
};

pub const BOOK_UPDATE: EditConfig = EditConfig {
    name: "book_form",
    fields: FieldAllowList::All,
    editable: book::EDITABLE_FIELDS,
    initial: &[],
    permission: STAFF,
};

pub const BOOK_DELETE: DeleteConfig = DeleteConfig {
    name: "book_confirm_delete",
    permission: STAFF,
    success_url: "/api/v1/catalog/books",
};
