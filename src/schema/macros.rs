/// Declare a struct together with its [`Record`](crate::Record) impl.
///
/// Fields annotated `#[csv("Column")]` bind to that column,
/// `#[csv(embedded)]` splices a nested record's fields in place, and fields
/// without `#[csv]` are left out of the schema. Other field attributes and
/// doc comments are kept on the generated struct.
///
/// ```
/// use chrono::{DateTime, Utc};
///
/// csvbind::csv_record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Contact {
///         #[csv("Phone")]
///         pub phone: String,
///     }
/// }
///
/// csvbind::csv_record! {
///     #[derive(Debug, Clone, Default)]
///     pub struct Person {
///         /// Primary key.
///         #[csv("ID")]
///         pub id: u64,
///         #[csv("Joined")]
///         pub joined: Option<DateTime<Utc>>,
///         #[csv(embedded)]
///         pub contact: Contact,
///         pub scratch: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! csv_record {
    (@field $schema:ident, $field:ident, embedded) => {
        $schema.embedded(|r: &mut Self| &mut r.$field);
    };
    (@field $schema:ident, $field:ident, $column:literal) => {
        $schema.field($column, |r: &mut Self| &mut r.$field);
    };

    // Every field sorted: emit the struct and its `Record` impl.
    (@emit [[$(#[$meta:meta])*] $vis:vis $name:ident]
        [$($fields:tt)*]
        [$(($dfield:ident, $($dtag:tt)+))*]
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($fields)*
        }

        impl $crate::Record for $name {
            #[allow(unused_variables)]
            fn describe(schema: &mut $crate::SchemaBuilder<Self>) {
                $( $crate::csv_record!(@field schema, $dfield, $($dtag)+); )*
            }
        }
    };

    // Field state: { [unsorted attrs] [kept attrs] [csv tag] vis name: ty }
    (@fields $ctx:tt $fields:tt $desc:tt) => {
        $crate::csv_record!(@emit $ctx $fields $desc);
    };
    (@fields $ctx:tt $fields:tt $desc:tt
        { [#[csv($($tag:tt)+)] $($attrs:tt)*] [$($kept:tt)*] [] $($sig:tt)* }
        $($rest:tt)*
    ) => {
        $crate::csv_record!(@fields $ctx $fields $desc
            { [$($attrs)*] [$($kept)*] [$($tag)+] $($sig)* }
            $($rest)*
        );
    };
    (@fields $ctx:tt $fields:tt $desc:tt
        { [#[$($attr:tt)*] $($attrs:tt)*] [$($kept:tt)*] $tag:tt $($sig:tt)* }
        $($rest:tt)*
    ) => {
        $crate::csv_record!(@fields $ctx $fields $desc
            { [$($attrs)*] [$($kept)* #[$($attr)*]] $tag $($sig)* }
            $($rest)*
        );
    };
    (@fields $ctx:tt [$($fields:tt)*] [$($desc:tt)*]
        { [] [$($kept:tt)*] [$($tag:tt)+] $fvis:vis $field:ident : $ty:ty }
        $($rest:tt)*
    ) => {
        $crate::csv_record!(@fields $ctx
            [$($fields)* $($kept)* $fvis $field: $ty,]
            [$($desc)* ($field, $($tag)+)]
            $($rest)*
        );
    };
    (@fields $ctx:tt [$($fields:tt)*] $desc:tt
        { [] [$($kept:tt)*] [] $fvis:vis $field:ident : $ty:ty }
        $($rest:tt)*
    ) => {
        $crate::csv_record!(@fields $ctx
            [$($fields)* $($kept)* $fvis $field: $ty,]
            $desc
            $($rest)*
        );
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$($fattr:tt)*])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $crate::csv_record!(@fields [[$(#[$meta])*] $vis $name] [] []
            $( { [$(#[$($fattr)*])*] [] [] $fvis $field: $ty } )*
        );
    };
}
