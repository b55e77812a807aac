use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(AgeGroup {
    Child => "child",
    Adult => "adult",
    Senior => "senior",
});

str_enum!(Language {
    En => "en",
    Hi => "hi",
    Ta => "ta",
    Te => "te",
    Bn => "bn",
});

str_enum!(Provenance {
    Online => "online",
    Offline => "offline",
});

impl AgeGroup {
    /// Bucket an age in years: under 18 is a child, 18–59 an adult,
    /// 60 and over a senior.
    pub fn from_age(age: u8) -> Self {
        match age {
            0..=17 => Self::Child,
            18..=59 => Self::Adult,
            _ => Self::Senior,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}
