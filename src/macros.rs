#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static regex is valid"));
        &*RE
    }};
}

/// Build a [`Bindings`](crate::Bindings) map from `name => obj` pairs.
#[macro_export]
macro_rules! bindings {
    () => { $crate::Bindings::new() };
    ( $($name:expr => $value:expr),+ $(,)? ) => {{
        let mut map = $crate::Bindings::new();
        $( map.insert(::std::string::String::from($name), $value); )+
        map
    }};
}

/// Declare the parameter table of a [`Parsable`](crate::Parsable) type.
///
/// Every field listed must implement `Display + FromStr`; the table maps the
/// field name to a getter/setter pair that converts through string values.
///
/// ```ignore
/// parameters!(Model { learning_rate, depth });
/// ```
#[macro_export]
macro_rules! parameters {
    ($ty:ty { $($field:ident),* $(,)? }) => {{
        $crate::ParameterTable::<$ty>::new()
            $( .scalar(stringify!($field), |t: &$ty| &t.$field, |t: &mut $ty| &mut t.$field) )*
    }};
}
