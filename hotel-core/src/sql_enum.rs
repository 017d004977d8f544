/// Declares a closed set of string states backed by a Postgres enum type.
///
/// The generated type converts to and from its text label through `Display`,
/// `FromStr`, serde and diesel's `ToSql`/`FromSql`.
///
/// ```ignore
/// sql_enum! {
///     pub enum TableStatus => crate::schema::sql_types::TableStatus {
///         Available = "available",
///         Occupied = "occupied",
///     }
/// }
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident => $sql_type:path {
            $($variant:ident = $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            diesel::deserialize::FromSqlRow,
            diesel::expression::AsExpression,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[diesel(sql_type = $sql_type)]
        $vis enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::ServiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::error::ServiceError::validation(format!(
                        "Unknown {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl diesel::serialize::ToSql<$sql_type, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                std::io::Write::write_all(out, self.as_str().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<$sql_type, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let text = std::str::from_utf8(bytes.as_bytes())?;
                text.parse::<$name>()
                    .map_err(|_| "Unrecognized enum variant".into())
            }
        }
    };
}
