use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of classes. Ids are what gets persisted; names are for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassId {
    Green,
    Yellow,
    Squirrel,
    Rabbit,
    Giraffe,
    Deer,
    Koala,
}

impl ClassId {
    pub const ALL: [ClassId; 7] = [
        ClassId::Green,
        ClassId::Yellow,
        ClassId::Squirrel,
        ClassId::Rabbit,
        ClassId::Giraffe,
        ClassId::Deer,
        ClassId::Koala,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassId::Green => "green",
            ClassId::Yellow => "yellow",
            ClassId::Squirrel => "squirrel",
            ClassId::Rabbit => "rabbit",
            ClassId::Giraffe => "giraffe",
            ClassId::Deer => "deer",
            ClassId::Koala => "koala",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ClassId::Green => "초록반",
            ClassId::Yellow => "노랑반",
            ClassId::Squirrel => "다람쥐반",
            ClassId::Rabbit => "토끼반",
            ClassId::Giraffe => "기린반",
            ClassId::Deer => "사슴반",
            ClassId::Koala => "코알라반",
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        ClassId::ALL
            .into_iter()
            .find(|c| c.as_str() == t)
            .ok_or_else(|| StoreError::UnknownClass(t.to_string()))
    }
}
