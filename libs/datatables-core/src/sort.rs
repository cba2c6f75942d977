use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// Direction as sent by the client in `order[i][dir]`.
    ///
    /// Only the exact lowercase tokens `asc` and `desc` are recognised;
    /// `DESC`, `Desc`, `descending` or a missing value all sort ascending.
    pub fn from_request_token(token: Option<&str>) -> Self {
        match token {
            Some("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        }
    }

    /// Direction written in a `default_additional_sort` token
    /// (`column.desc`, `column.ASC`, ...). Case-insensitive; anything
    /// unrecognised sorts ascending.
    pub fn from_config_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if t.trim().eq_ignore_ascii_case("desc") => SortDir::Desc,
            _ => SortDir::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}
