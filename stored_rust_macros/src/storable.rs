use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Path};

struct TypeOptions {
    table: String,
    versioning: Option<LitStr>,
    parents: Vec<Path>,
}

struct IndexField {
    name: String,
    field: Ident,
}

pub fn derive_storable(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let options = extract_type_options(input)?;
    let indexes = extract_index_fields(input)?;

    let table = &options.table;
    let versioning = options.versioning.as_ref().map(|mode| {
        quote! { const VERSIONING: &'static str = #mode; }
    });

    let index_names = indexes.iter().map(|index| &index.name);
    let index_inserts = indexes.iter().map(|index| {
        let key = &index.name;
        let field = &index.field;
        quote! {
            values.insert(#key.to_string(), ::stored_rust::record::index_value(&self.#field));
        }
    });
    let indexes_fn = if indexes.is_empty() {
        None
    } else {
        Some(quote! {
            fn indexes(&self) -> ::stored_rust::record::IndexValues {
                let mut values = ::stored_rust::record::IndexValues::new();
                #(#index_inserts)*
                values
            }
        })
    };

    let parents = &options.parents;
    let parents_fn = if parents.is_empty() {
        None
    } else {
        Some(quote! {
            fn parents() -> ::std::vec::Vec<::stored_rust::record::Lineage> {
                vec![#(::stored_rust::record::lineage_of::<#parents>()),*]
            }
        })
    };

    Ok(quote! {
        impl #impl_generics ::stored_rust::Storable for #name #ty_generics #where_clause {
            const TABLE_NAME: &'static str = #table;
            #versioning
            const INDEX_NAMES: &'static [&'static str] = &[#(#index_names),*];

            #indexes_fn
            #parents_fn
        }
    })
}

fn extract_type_options(input: &DeriveInput) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions {
        table: input.ident.to_string(),
        versioning: None,
        parents: Vec::new(),
    };

    for attr in &input.attrs {
        if !attr.path().is_ident("storable") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                options.table = value.value();
                Ok(())
            } else if meta.path.is_ident("versioning") {
                let value: LitStr = meta.value()?.parse()?;
                options.versioning = Some(value);
                Ok(())
            } else if meta.path.is_ident("parents") {
                meta.parse_nested_meta(|parent| {
                    options.parents.push(parent.path);
                    Ok(())
                })
            } else {
                Err(meta.error("expected `table`, `versioning` or `parents`"))
            }
        })?;
    }

    Ok(options)
}

fn extract_index_fields(input: &DeriveInput) -> syn::Result<Vec<IndexField>> {
    let fields = match &input.data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Storable derive needs a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Storable derive only supports structs",
            ))
        }
    };

    let mut indexes = Vec::new();
    for field in fields {
        let Some(ident) = &field.ident else { continue };
        for attr in &field.attrs {
            if !attr.path().is_ident("storable") {
                continue;
            }

            let mut index_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("index") {
                    index_name = Some(if meta.input.peek(syn::Token![=]) {
                        let value: LitStr = meta.value()?.parse()?;
                        value.value()
                    } else {
                        ident.to_string()
                    });
                    Ok(())
                } else {
                    Err(meta.error("expected `index`"))
                }
            })?;

            if let Some(name) = index_name {
                indexes.push(IndexField {
                    name,
                    field: ident.clone(),
                });
            }
        }
    }

    Ok(indexes)
}
