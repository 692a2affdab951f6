use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Gender::Male),
            1 => Some(Gender::Female),
            _ => None,
        }
    }

    /// Case-insensitive name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("male") {
            Some(Gender::Male)
        } else if name.eq_ignore_ascii_case("female") {
            Some(Gender::Female)
        } else {
            None
        }
    }

    pub fn from_raw(raw: &RawEnum) -> Option<Self> {
        match raw {
            RawEnum::Code(n) => Gender::from_code(*n),
            RawEnum::Name(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Gender::from_code)
                .or_else(|| Gender::from_name(s)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::from_raw(&RawEnum::Name(s.to_string()))
            .ok_or_else(|| "expected Male, Female, 0 or 1".to_string())
    }
}

/// An enum as sent by a client, not yet checked: either its numeric code or its name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawEnum {
    Code(i64),
    Name(String),
}

impl fmt::Display for RawEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawEnum::Code(n) => write!(f, "{}", n),
            RawEnum::Name(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_names_and_codes() {
        let parse = |json: &str| Gender::from_raw(&serde_json::from_str::<RawEnum>(json).unwrap());
        assert_eq!(parse("\"female\""), Some(Gender::Female));
        assert_eq!(parse("\"MALE\""), Some(Gender::Male));
        assert_eq!(parse("1"), Some(Gender::Female));
        assert_eq!(parse("\"0\""), Some(Gender::Male));
        assert_eq!(parse("7"), None);
        assert_eq!(parse("\"Other\""), None);
    }

    #[test]
    fn renders_as_name() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"Female\"");
        assert_eq!("1".parse::<Gender>(), Ok(Gender::Female));
    }
}
