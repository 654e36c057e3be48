use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Expr, FnArg, ItemFn, MetaNameValue, ReturnType, Token};

/// Parsed `#[cached(...)]` attributes.
struct CachedAttributes {
    ttl: TokenStream2,
    max_size: TokenStream2,
    policy: TokenStream2,
    coalesce: TokenStream2,
    custom_name: Option<String>,
}

impl Default for CachedAttributes {
    fn default() -> Self {
        Self {
            ttl: quote! { ::memoflight::DEFAULT_TTL_SECS },
            max_size: quote! { 0usize },
            policy: quote! { "none" },
            coalesce: quote! { false },
            custom_name: None,
        }
    }
}

fn parse_attributes(attr: TokenStream2) -> Result<CachedAttributes, TokenStream2> {
    let mut attrs = CachedAttributes::default();
    if attr.is_empty() {
        return Ok(attrs);
    }

    let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
    let parsed = syn::parse::Parser::parse2(parser, attr).map_err(|err| {
        let msg = format!("invalid #[cached] attributes: {err}");
        quote! { compile_error!(#msg); }
    })?;

    for nv in parsed {
        let name = nv
            .path
            .get_ident()
            .map(|ident| ident.to_string())
            .unwrap_or_default();
        match name.as_str() {
            "ttl" => attrs.ttl = parse_int_value(&nv, "ttl")?,
            "max_size" => attrs.max_size = parse_int_value(&nv, "max_size")?,
            "policy" => {
                let value = parse_str_value(&nv, "policy")?;
                if !matches!(value.as_str(), "none" | "fifo" | "lru") {
                    return Err(quote! {
                        compile_error!("invalid policy: expected \"none\", \"fifo\", or \"lru\"");
                    });
                }
                attrs.policy = quote! { #value };
            }
            "coalesce" => attrs.coalesce = parse_bool_value(&nv, "coalesce")?,
            "name" => attrs.custom_name = Some(parse_str_value(&nv, "name")?),
            other => {
                let msg = format!(
                    "unknown #[cached] attribute `{other}`; \
                     expected ttl, max_size, policy, coalesce, or name"
                );
                return Err(quote! { compile_error!(#msg); });
            }
        }
    }
    Ok(attrs)
}

fn parse_int_value(nv: &MetaNameValue, name: &str) -> Result<TokenStream2, TokenStream2> {
    if let Expr::Lit(expr_lit) = &nv.value {
        if let syn::Lit::Int(lit_int) = &expr_lit.lit {
            return Ok(quote! { #lit_int });
        }
    }
    let msg = format!("invalid `{name}`: expected `{name} = <integer>`");
    Err(quote! { compile_error!(#msg); })
}

fn parse_str_value(nv: &MetaNameValue, name: &str) -> Result<String, TokenStream2> {
    if let Expr::Lit(expr_lit) = &nv.value {
        if let syn::Lit::Str(lit_str) = &expr_lit.lit {
            return Ok(lit_str.value());
        }
    }
    let msg = format!("invalid `{name}`: expected `{name} = \"...\"`");
    Err(quote! { compile_error!(#msg); })
}

fn parse_bool_value(nv: &MetaNameValue, name: &str) -> Result<TokenStream2, TokenStream2> {
    if let Expr::Lit(expr_lit) = &nv.value {
        if let syn::Lit::Bool(lit_bool) = &expr_lit.lit {
            return Ok(quote! { #lit_bool });
        }
    }
    let msg = format!("invalid `{name}`: expected `{name} = true|false`");
    Err(quote! { compile_error!(#msg); })
}

/// If the return type is a plain `Result<T, E>`, yields `(T, E)`.
fn result_type_args(ret: &syn::Type) -> Option<(syn::Type, syn::Type)> {
    let syn::Type::Path(type_path) = ret else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });
    let ok = types.next()?;
    let err = types.next()?;
    Some((ok, err))
}

/// Adds automatic caching to an async function or method.
///
/// The generated wrapper derives a cache key from the arguments (a single
/// argument is used directly; several are combined as an ordered tuple; for
/// methods `self` is part of the key), obtains a named cache instance from
/// the process-wide registry, and delegates to it. The cache name defaults
/// to the function name.
///
/// # Requirements
///
/// - the function must be `async`
/// - every argument (and `self`, for methods) must implement `Debug`
/// - the return type must implement `Clone`; for `Result<T, E>` both `T`
///   and `E` must implement `Clone`
///
/// # Attributes
///
/// - `ttl` - time-to-live in seconds (default 300; `0` disables caching)
/// - `max_size` - maximum number of entries, `0` = unbounded (default 0);
///   only effective together with a `policy`
/// - `policy` - `"none"`, `"fifo"`, or `"lru"` (default `"none"`)
/// - `coalesce` - `true` to deduplicate concurrent calls with the same key
///   into one execution of the body (default `false`)
/// - `name` - custom cache name in the registry (default: function name)
///
/// # Cache behavior
///
/// - `Result`-returning functions: only `Ok` values are ever cached; an
///   `Err` is returned to the caller (and to every coalesced waiter) and
///   the next call runs the body again
/// - expired entries are dropped on access, there is no background sweeper
///
/// # Examples
///
/// ```ignore
/// use memoflight::cached;
///
/// #[cached(ttl = 60, max_size = 500, policy = "lru", coalesce = true)]
/// async fn fetch_user(id: u64) -> Result<User, FetchError> {
///     api::fetch_user(id).await
/// }
/// ```
#[proc_macro_attribute]
pub fn cached(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attrs = match parse_attributes(attr.into()) {
        Ok(attrs) => attrs,
        Err(err) => return err.into(),
    };

    let input = parse_macro_input!(item as ItemFn);
    if input.sig.asyncness.is_none() {
        return quote! { compile_error!("#[cached] only supports async functions"); }.into();
    }

    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name = &sig.ident;

    let mut has_self = false;
    let mut arg_pats = Vec::new();
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(_) => has_self = true,
            FnArg::Typed(pat_type) => {
                let pat = &pat_type.pat;
                arg_pats.push(quote! { #pat });
            }
        }
    }

    let key_expr = match (has_self, arg_pats.len()) {
        (true, 0) => quote! { format!("{:?}", self) },
        (true, _) => quote! { format!("{:?}|{:?}", self, (#(&#arg_pats),*)) },
        (false, 0) => quote! { format!("{:?}", ()) },
        (false, 1) => {
            let arg = &arg_pats[0];
            quote! { format!("{:?}", #arg) }
        }
        (false, _) => quote! { format!("{:?}", (#(&#arg_pats),*)) },
    };

    let cache_name = attrs
        .custom_name
        .unwrap_or_else(|| fn_name.to_string());
    let ttl = &attrs.ttl;
    let max_size = &attrs.max_size;
    let policy = &attrs.policy;
    let coalesce = &attrs.coalesce;
    let config_expr = quote! {
        ::memoflight::CacheConfig::new(::std::time::Duration::from_secs(#ttl))
            .with_max_size(#max_size)
            .with_policy(::memoflight::EvictionPolicy::from(#policy))
            .with_coalescing(#coalesce)
    };

    let ret_type = match &sig.output {
        ReturnType::Type(_, ty) => (**ty).clone(),
        ReturnType::Default => syn::parse_quote! { () },
    };

    let body = if let Some((ok_ty, err_ty)) = result_type_args(&ret_type) {
        // Result-returning function: V is the Ok type, the Err type is
        // handed to every coalesced waiter and never cached.
        quote! {
            let __cache = ::memoflight::registry::global()
                .get_or_create::<::std::string::String, #ok_ty, #err_ty>(#cache_name, #config_expr);
            let __key = #key_expr;
            __cache.try_get_or_put(__key, move || async move #block).await
        }
    } else {
        quote! {
            let __cache = ::memoflight::registry::global()
                .get_or_create::<::std::string::String, #ret_type, ::std::convert::Infallible>(
                    #cache_name,
                    #config_expr,
                );
            let __key = #key_expr;
            __cache.get_or_put(__key, move || async move #block).await
        }
    };

    let expanded = quote! {
        #vis #sig {
            #body
        }
    };
    TokenStream::from(expanded)
}
