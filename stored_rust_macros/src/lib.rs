mod storable;

use proc_macro::TokenStream;

/// Derive macro for `Storable`.
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Storable)]
/// #[storable(table = "people", versioning = "delta", parents(Contact))]
/// struct Person {
///     #[storable(index)]
///     name: String,
///     #[storable(index = "years")]
///     age: i64,
/// }
/// ```
///
/// - `table`: defaults to the struct name.
/// - `versioning`: `"none"` (default) or `"delta"`; the `ver:` forms also work.
/// - `parents(...)`: other `Storable` types, most important first.
/// - `#[storable(index)]` on a field stores it as an index named after the
///   field; `index = "..."` picks another name.
#[proc_macro_derive(Storable, attributes(storable))]
pub fn derive_storable(input: TokenStream) -> TokenStream {
    storable::derive_storable(input)
}
