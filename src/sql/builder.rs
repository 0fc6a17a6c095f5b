//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for the catalog tables.

use crate::models::{Search, SearchFields};
use crate::pagination::PageWindow;
use crate::sql::params::BindValue;

const MAIN_ALIAS: &str = "main";

/// Static description of a table: identifiers here never come from user input.
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    /// Extra computed columns for listings: (SQL expression over `main`, alias).
    pub computed: &'static [(&'static str, &'static str)],
    /// ORDER BY terms over `main`, most significant first.
    pub order_by: &'static [OrderTerm],
}

#[derive(Clone, Copy, Debug)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One ORDER BY column. `fold_case` sorts on `lower(column)` so text order does not depend on collation.
#[derive(Clone, Copy, Debug)]
pub struct OrderTerm {
    pub column: &'static str,
    pub direction: Direction,
    pub fold_case: bool,
}

impl OrderTerm {
    pub const fn asc(column: &'static str) -> Self {
        OrderTerm {
            column,
            direction: Direction::Asc,
            fold_case: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        OrderTerm {
            column,
            direction: Direction::Desc,
            fold_case: false,
        }
    }

    pub const fn folded(self) -> Self {
        OrderTerm {
            fold_case: true,
            ..self
        }
    }

    fn sql(&self, alias: Option<&str>) -> String {
        let column = match alias {
            Some(a) => format!("{}.{}", a, quoted(self.column)),
            None => quoted(self.column),
        };
        if self.fold_case {
            format!("lower({}) {}", column, self.direction.sql())
        } else {
            format!("{} {}", column, self.direction.sql())
        }
    }
}

pub const CATEGORIES: TableSpec = TableSpec {
    name: "categories",
    columns: &["id", "name", "description", "image", "created_at", "updated_at"],
    computed: &[(
        "(SELECT COUNT(*) FROM \"products\" p WHERE p.\"category_id\" = main.\"id\")",
        "products_count",
    )],
    order_by: &[OrderTerm::asc("name").folded(), OrderTerm::asc("id")],
};

pub const PRODUCTS: TableSpec = TableSpec {
    name: "products",
    columns: &[
        "id",
        "name",
        "price",
        "image",
        "instock",
        "code",
        "description",
        "category_id",
        "created_at",
        "updated_at",
    ],
    computed: &[],
    order_by: &[OrderTerm::desc("created_at"), OrderTerm::desc("id")],
};

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_list(spec: &TableSpec, alias: Option<&str>) -> String {
    spec.columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{}", a, quoted(c)),
            None => quoted(c),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so the term matches literally. Backslash is PostgreSQL's default LIKE escape.
pub fn like_contains(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: impl Into<BindValue>) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v.into());
        n
    }
}

/// Conditions shared by listing and counting.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListFilter<'a> {
    pub search: Option<Search<'a>>,
    /// Exact match on a foreign key column: (column, id).
    pub parent: Option<(&'static str, i64)>,
}

fn where_clause(q: &mut QueryBuf, filter: &ListFilter<'_>) -> String {
    let mut parts = Vec::new();
    if let Some(search) = filter.search {
        let n = q.push_param(like_contains(search.term));
        parts.push(search_condition(search.fields, n));
    }
    if let Some((column, id)) = filter.parent {
        let n = q.push_param(id);
        parts.push(format!("{}.{} = ${}", MAIN_ALIAS, quoted(column), n));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// `(main."a" ILIKE $n OR main."b" ILIKE $n ...)`: one bound pattern, OR across fields.
fn search_condition(fields: &SearchFields, param: u32) -> String {
    let ors: Vec<String> = fields
        .names()
        .iter()
        .map(|f| format!("{}.{} ILIKE ${}", MAIN_ALIAS, quoted(f), param))
        .collect();
    format!("({})", ors.join(" OR "))
}

/// SELECT one page of rows in the table's default order.
pub fn select_list(spec: &TableSpec, filter: &ListFilter<'_>, window: PageWindow) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut select_parts = vec![column_list(spec, Some(MAIN_ALIAS))];
    for (expr, alias) in spec.computed {
        select_parts.push(format!("{} AS {}", expr, quoted(alias)));
    }
    let where_sql = where_clause(&mut q, filter);
    let order: Vec<String> = spec.order_by.iter().map(|t| t.sql(Some(MAIN_ALIAS))).collect();
    q.sql = format!(
        "SELECT {} FROM {} {}{} ORDER BY {} LIMIT {} OFFSET {}",
        select_parts.join(", "),
        quoted(spec.name),
        MAIN_ALIAS,
        where_sql,
        order.join(", "),
        window.limit,
        window.offset
    );
    q
}

/// SELECT COUNT(*) under the same conditions as `select_list`.
pub fn count(spec: &TableSpec, filter: &ListFilter<'_>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, filter);
    q.sql = format!("SELECT COUNT(*) FROM {} {}{}", quoted(spec.name), MAIN_ALIAS, where_sql);
    q
}

/// SELECT every row in the table's default order, without computed columns.
pub fn select_all(spec: &TableSpec) -> String {
    let order: Vec<String> = spec.order_by.iter().map(|t| t.sql(None)).collect();
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        column_list(spec, None),
        quoted(spec.name),
        order.join(", ")
    )
}

/// SELECT by primary key. Caller binds the id as $1.
pub fn select_by_id(spec: &TableSpec) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        column_list(spec, None),
        quoted(spec.name),
        quoted("id")
    )
}

/// EXISTS check for a value in `column`, optionally case-insensitive, optionally excluding one id.
pub fn exists_matching(spec: &TableSpec, column: &str, value: &str, case_insensitive: bool, exclude_id: Option<i64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value.to_string());
    let condition = if case_insensitive {
        format!("lower({}) = lower(${})", quoted(column), n)
    } else {
        format!("{} = ${}", quoted(column), n)
    };
    let exclude = match exclude_id {
        Some(id) => {
            let n = q.push_param(id);
            format!(" AND {} <> ${}", quoted("id"), n)
        }
        None => String::new(),
    };
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {}{})",
        quoted(spec.name),
        condition,
        exclude
    );
    q
}

/// One column assignment for INSERT/UPDATE.
#[derive(Debug)]
pub struct Assignment {
    pub column: &'static str,
    pub value: BindValue,
    /// On UPDATE, keep the stored value when the bound value is NULL.
    pub keep_when_null: bool,
}

impl Assignment {
    pub fn set(column: &'static str, value: impl Into<BindValue>) -> Self {
        Assignment {
            column,
            value: value.into(),
            keep_when_null: false,
        }
    }

    pub fn set_if_present(column: &'static str, value: Option<String>) -> Self {
        Assignment {
            column,
            value: BindValue::OptText(value),
            keep_when_null: true,
        }
    }
}

/// INSERT ... RETURNING all columns. Timestamps come from column defaults.
pub fn insert(spec: &TableSpec, values: Vec<Assignment>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for a in values {
        let n = q.push_param(a.value);
        cols.push(quoted(a.column));
        placeholders.push(format!("${}", n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(spec.name),
        cols.join(", "),
        placeholders.join(", "),
        column_list(spec, None)
    );
    q
}

/// UPDATE by id, refreshing `updated_at`. Returns no row when the id does not exist.
pub fn update(spec: &TableSpec, id: i64, values: Vec<Assignment>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(values.len() + 1);
    for a in values {
        let keep = a.keep_when_null;
        let n = q.push_param(a.value);
        let column = quoted(a.column);
        if keep {
            sets.push(format!("{} = COALESCE(${}, {})", column, n, column));
        } else {
            sets.push(format!("{} = ${}", column, n));
        }
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_param = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(spec.name),
        sets.join(", "),
        quoted("id"),
        id_param,
        column_list(spec, None)
    );
    q
}

/// DELETE by id ($1), returning the removed row.
pub fn delete(spec: &TableSpec) -> String {
    format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(spec.name),
        quoted("id"),
        column_list(spec, None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityKind;

    #[test]
    fn search_uses_one_param_across_or_fields() {
        let fields = SearchFields::all(EntityKind::Category);
        let filter = ListFilter {
            search: Search::new(Some("shirt"), &fields),
            parent: None,
        };
        let q = select_list(&CATEGORIES, &filter, PageWindow { offset: 8, limit: 8 });
        assert!(q.sql.contains("(main.\"name\" ILIKE $1 OR main.\"description\" ILIKE $1)"));
        assert!(q.sql.contains("AS \"products_count\""));
        assert!(q.sql.ends_with("ORDER BY lower(main.\"name\") ASC, main.\"id\" ASC LIMIT 8 OFFSET 8"));
        assert_eq!(q.params, vec![BindValue::Text("%shirt%".into())]);
    }

    #[test]
    fn category_choices_sort_ignoring_case() {
        assert_eq!(
            select_all(&CATEGORIES),
            "SELECT \"id\", \"name\", \"description\", \"image\", \"created_at\", \"updated_at\" \
             FROM \"categories\" ORDER BY lower(\"name\") ASC, \"id\" ASC"
        );
    }

    #[test]
    fn count_without_filter_has_no_where() {
        let q = count(&PRODUCTS, &ListFilter::default());
        assert_eq!(q.sql, "SELECT COUNT(*) FROM \"products\" main");
        assert!(q.params.is_empty());
    }

    #[test]
    fn parent_filter_binds_after_search() {
        let fields = SearchFields::all(EntityKind::Product);
        let filter = ListFilter {
            search: Search::new(Some("tee"), &fields),
            parent: Some(("category_id", 4)),
        };
        let q = count(&PRODUCTS, &filter);
        assert!(q.sql.contains("AND main.\"category_id\" = $2"));
        assert_eq!(q.params[1], BindValue::BigInt(4));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn exists_excludes_current_record() {
        let q = exists_matching(&CATEGORIES, "name", "Shoes", true, Some(3));
        assert_eq!(
            q.sql,
            "SELECT EXISTS(SELECT 1 FROM \"categories\" WHERE lower(\"name\") = lower($1) AND \"id\" <> $2)"
        );
        assert_eq!(q.params.len(), 2);
    }

    #[test]
    fn update_keeps_image_when_absent() {
        let q = update(
            &PRODUCTS,
            9,
            vec![Assignment::set("name", "Tee"), Assignment::set_if_present("image", None)],
        );
        assert!(q.sql.contains("\"image\" = COALESCE($2, \"image\")"));
        assert!(q.sql.contains("\"updated_at\" = NOW()"));
        assert!(q.sql.contains("WHERE \"id\" = $3"));
    }
}
