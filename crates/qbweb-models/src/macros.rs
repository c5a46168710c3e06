//! Declarative helpers for records the daemon patches field-by-field.

/// Declare a cached record together with its partial-update counterpart.
///
/// The record keeps every field the client models plus an `extra` map for
/// anything else the daemon sends. The patch mirrors the record with every
/// field optional; `apply` copies the present fields over and deep-merges the
/// unmodelled remainder.
macro_rules! patchable_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident => $patch:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
            /// Fields sent by the daemon that this record does not model.
            #[serde(flatten)]
            pub extra: serde_json::Map<String, serde_json::Value>,
        }

        #[doc = concat!(
            "Partial update for [`",
            stringify!($name),
            "`]; absent fields are left untouched."
        )]
        #[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(default)]
        pub struct $patch {
            $(
                $(#[$field_meta])*
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
            /// Unmodelled fields carried by the update.
            #[serde(flatten)]
            pub extra: serde_json::Map<String, serde_json::Value>,
        }

        impl $name {
            /// Merge a partial update into the record. Present fields win.
            pub fn apply(&mut self, patch: $patch) {
                $(
                    if let Some(value) = patch.$field {
                        self.$field = value;
                    }
                )*
                $crate::merge::merge_object(&mut self.extra, patch.extra);
            }
        }

        impl From<$patch> for $name {
            fn from(patch: $patch) -> Self {
                let mut record = Self::default();
                record.apply(patch);
                record
            }
        }
    };
}
