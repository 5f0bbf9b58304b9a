use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
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
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(TurnRole {
    User => "user",
    Assistant => "assistant",
});

str_enum!(CardKind {
    Narrative => "narrative",
    QuestionList => "question_list",
});

str_enum!(ConversationMode {
    Cards => "cards",
    Stream => "stream",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn turn_role_round_trip() {
        for (variant, s) in [(TurnRole::User, "user"), (TurnRole::Assistant, "assistant")] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(TurnRole::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn card_kind_round_trip() {
        for (variant, s) in [
            (CardKind::Narrative, "narrative"),
            (CardKind::QuestionList, "question_list"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(CardKind::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = ConversationMode::from_str("chat").unwrap_err();
        assert!(err.to_string().contains("ConversationMode"));
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&CardKind::QuestionList).unwrap();
        assert_eq!(json, "\"question_list\"");
        let json = serde_json::to_string(&ConversationMode::Stream).unwrap();
        assert_eq!(json, "\"stream\"");
    }
}
