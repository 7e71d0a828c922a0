//! Macros for ergonomic machine declaration.

/// Generate a state enum together with its `State` implementation.
///
/// # Example
///
/// ```
/// use stateloop::state_enum;
/// use stateloop::core::State;
///
/// state_enum! {
///     pub enum Door {
///         Open,
///         Closed,
///         Broken,
///     }
///     final: [Broken]
/// }
///
/// assert_eq!(Door::Closed.name(), "Closed");
/// assert!(Door::Broken.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

/// Generate a message enum, its payload-free kind enum, and the `Message`
/// implementation tying them together.
///
/// The kind enum has one unit variant per message variant, with the same
/// name. Payload variants take a tuple of types.
///
/// # Example
///
/// ```
/// use stateloop::message_enum;
/// use stateloop::core::Message;
///
/// message_enum! {
///     pub enum Command => CommandKind {
///         Open,
///         Lock(u32),
///         Rename(String, bool),
///     }
/// }
///
/// assert_eq!(Command::Lock(7).kind(), CommandKind::Lock);
/// assert_eq!(Command::Open.kind(), CommandKind::Open);
/// ```
#[macro_export]
macro_rules! message_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident => $kind:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(( $($field:ty),* $(,)? ))?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $(( $($field),* ))?
            ),*
        }

        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $kind {
            $($variant),*
        }

        impl $crate::core::Message for $name {
            type Kind = $kind;

            fn kind(&self) -> $kind {
                match self {
                    $(Self::$variant { .. } => $kind::$variant),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Message, State};

    state_enum! {
        enum TestState {
            Idle,
            Running,
            Done,
        }
        final: [Done]
    }

    message_enum! {
        enum TestMessage => TestKind {
            Go,
            Tick(u64),
            Named(String, u8),
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Idle.name(), "Idle");
        assert!(!TestState::Idle.is_final());
        assert!(!TestState::Running.is_final());
        assert!(TestState::Done.is_final());
    }

    #[test]
    fn state_enum_supports_visibility() {
        state_enum! {
            pub enum PublicState {
                A,
                B,
            }
        }

        assert_ne!(PublicState::A, PublicState::B);
    }

    #[test]
    fn state_enum_works_without_final() {
        state_enum! {
            enum MinimalState {
                One,
                Two,
            }
        }

        assert!(!MinimalState::One.is_final());
        assert!(!MinimalState::Two.is_final());
    }

    #[test]
    fn message_enum_maps_variants_to_kinds() {
        assert_eq!(TestMessage::Go.kind(), TestKind::Go);
        assert_eq!(TestMessage::Tick(9).kind(), TestKind::Tick);
        assert_eq!(TestMessage::Named("x".into(), 1).kind(), TestKind::Named);
    }

    #[test]
    fn payload_does_not_affect_kind() {
        assert_eq!(TestMessage::Tick(1).kind(), TestMessage::Tick(2).kind());
    }
}
