use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::text_column;

/// Elevated roles. A user without a role is a regular user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Premium,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Premium => f.write_str("premium"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

text_column!(Role);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sex {0:?}, expected MALE, FEMALE or OTHER")]
pub struct UnknownSex(String);

impl FromStr for Sex {
    type Err = UnknownSex;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Sex::Male),
            "FEMALE" => Ok(Sex::Female),
            "OTHER" => Ok(Sex::Other),
            other => Err(UnknownSex(other.to_owned())),
        }
    }
}

text_column!(Sex);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sex_parses_its_wire_names() {
        for sex in [Sex::Male, Sex::Female, Sex::Other] {
            let wire = serde_json::to_value(sex).unwrap();
            assert_eq!(wire.as_str().unwrap().parse::<Sex>(), Ok(sex));
        }
        assert!("male".parse::<Sex>().is_err());
        assert!("X".parse::<Sex>().is_err());
    }
}
