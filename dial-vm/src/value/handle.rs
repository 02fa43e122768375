//! Non-owning handles into the [`crate::pool::Pool`]'s arenas.
//!
//! Each handle is a plain arena index. The Pool is the single owner of the
//! underlying storage; handles never carry lifetime-bound references, so a
//! `Value` stays `Copy` and can be freely duplicated on the operand stack.

macro_rules! handle_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw arena index.
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            /// The raw arena index.
            pub fn index(self) -> u32 {
                self.0
            }
        }
    };
}

handle_type!(StringHandle, "A handle into the Pool's string arena.");
handle_type!(ObjectHandle, "A handle into the Pool's object arena.");
handle_type!(ArrayHandle, "A handle into the Pool's array arena.");
handle_type!(FunctionHandle, "A handle into the Pool's function arena.");
