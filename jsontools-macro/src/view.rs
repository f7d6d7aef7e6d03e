use crate::declaration::{MethodViewArgs, Names};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, parse::Parse, parse::ParseStream, parse_macro_input, Attribute, FnArg,
    ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, ReturnType, Token, Type,
};

/// Handler names that turn into REST operations once a primary key is set.
const REST_OPERATIONS: [&str; 6] = ["list", "create", "get", "replace", "update", "delete"];

#[derive(Default)]
struct ViewArgs {
    name: Option<LitStr>,
    primary_key: Option<Names>,
    extends: Option<Type>,
    disable: Vec<LitStr>,
}

impl Parse for ViewArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ViewArgs::default();
        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if name == "name" {
                args.name = Some(input.parse()?);
            } else if name == "primary_key" {
                args.primary_key = Some(input.parse()?);
            } else if name == "extends" {
                args.extends = Some(input.parse()?);
            } else if name == "disable" {
                let Names(names) = input.parse()?;
                args.disable.extend(names);
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "unknown view argument, expected `name`, `primary_key`, `extends` or `disable`",
                ));
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

enum ArgKind {
    /// The whole `RouteParams` map.
    All,
    Optional(Type),
    Required(Type),
}

struct HandlerArg {
    name: String,
    kind: ArgKind,
}

struct HandlerInfo {
    fn_name: syn::Ident,
    declaration: Option<MethodViewArgs>,
    args: Vec<HandlerArg>,
    is_async: bool,
    returns_result: bool,
}

pub fn view_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ViewArgs);
    let input = parse_macro_input!(item as ItemImpl);
    match generate_view_impl(&args, input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

fn generate_view_impl(args: &ViewArgs, mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[view] goes on an inherent impl block",
        ));
    }

    let mut handlers = Vec::new();
    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            if let Some(info) = extract_handler_info(method)? {
                handlers.push(info);
            }
        }
    }

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let view_name = match &args.name {
        Some(name) => name.value(),
        None => type_name(self_ty),
    };

    let wrappers = handlers.iter().map(generate_wrapper);

    let disables = args.disable.iter().map(|name| quote! { .disable(#name) });

    let inherit = args.extends.as_ref().map(|parent| {
        quote! {
            let __parent = <#parent as ::jsontools::MethodView>::registry()?;
            let __builder = __builder.inherit(
                &__parent,
                <Self as ::core::convert::AsRef<#parent>>::as_ref,
            );
        }
    });

    let primary_key = args.primary_key.as_ref().map(|Names(fields)| {
        if fields.is_empty() {
            quote! { .primary_key(::std::vec::Vec::<::std::string::String>::new()) }
        } else {
            quote! { .primary_key([#(#fields),*]) }
        }
    });

    let members = handlers.iter().map(|info| {
        let name = info.fn_name.unraw().to_string();
        let wrapper = wrapper_ident(&info.fn_name);
        let declaration = match &info.declaration {
            Some(decl) => {
                let decl = decl.declaration();
                quote! { ::core::option::Option::Some(#decl) }
            }
            None => quote! { ::core::option::Option::None },
        };
        quote! { .member_with(#name, #declaration, Self::#wrapper) }
    });

    // statics cannot name generic parameters, so only concrete views cache
    let cached = input.generics.params.is_empty().then(|| {
        quote! {
            fn registry() -> ::jsontools::Result<::std::sync::Arc<::jsontools::ViewRegistry<Self>>> {
                static REGISTRY: ::std::sync::OnceLock<
                    ::std::sync::Arc<::jsontools::ViewRegistry<#self_ty>>,
                > = ::std::sync::OnceLock::new();
                if let ::core::option::Option::Some(registry) = REGISTRY.get() {
                    return ::core::result::Result::Ok(::std::sync::Arc::clone(registry));
                }
                let built = ::std::sync::Arc::new(<Self as ::jsontools::MethodView>::build_registry()?);
                ::core::result::Result::Ok(::std::sync::Arc::clone(REGISTRY.get_or_init(|| built)))
            }
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics #self_ty #where_clause {
            #(#wrappers)*
        }

        impl #impl_generics ::jsontools::MethodView for #self_ty #where_clause {
            fn build_registry() -> ::jsontools::Result<::jsontools::ViewRegistry<Self>> {
                let __builder = ::jsontools::ViewRegistry::<Self>::builder(#view_name) #(#disables)*;
                #inherit
                __builder
                    #primary_key
                    #(#members)*
                    .build()
            }

            #cached
        }
    })
}

/// Collect the handler of `method` and strip its `#[methodview]` attribute.
///
/// Returns `None` for methods that are neither declared nor named after a
/// REST operation.
fn extract_handler_info(method: &mut ImplItemFn) -> syn::Result<Option<HandlerInfo>> {
    let mut declaration = None;
    let mut kept = Vec::with_capacity(method.attrs.len());
    for attr in method.attrs.drain(..) {
        if is_methodview_attr(&attr) {
            if declaration.is_some() {
                return Err(syn::Error::new_spanned(&attr, "duplicate #[methodview] attribute"));
            }
            declaration = Some(parse_methodview(&attr)?);
        } else {
            kept.push(attr);
        }
    }
    method.attrs = kept;

    let fn_name = method.sig.ident.clone();
    let is_rest_name = REST_OPERATIONS.contains(&fn_name.unraw().to_string().as_str());
    if declaration.is_none() && !is_rest_name {
        return Ok(None);
    }

    match method.sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        // associated functions named like an operation are not handlers
        None | Some(FnArg::Typed(_)) if declaration.is_none() => return Ok(None),
        _ => {
            return Err(syn::Error::new_spanned(
                &method.sig,
                "view handlers must take `&self`",
            ))
        }
    }

    let mut args = Vec::new();
    for input in method.sig.inputs.iter().skip(1) {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = &*pat_type.pat else {
            return Err(syn::Error::new_spanned(
                &pat_type.pat,
                "view handler arguments must be plain identifiers named after route params",
            ));
        };
        // `_id` reads the `id` param
        let name = pat_ident.ident.unraw().to_string();
        args.push(HandlerArg {
            name: name.trim_start_matches('_').to_string(),
            kind: arg_kind(&pat_type.ty),
        });
    }

    Ok(Some(HandlerInfo {
        fn_name,
        declaration,
        args,
        is_async: method.sig.asyncness.is_some(),
        returns_result: returns_result(&method.sig.output),
    }))
}

fn generate_wrapper(info: &HandlerInfo) -> TokenStream2 {
    let fn_name = &info.fn_name;
    let wrapper = wrapper_ident(fn_name);

    let arg_idents: Vec<_> = (0..info.args.len())
        .map(|i| format_ident!("__jsontools_arg_{}", i))
        .collect();
    let extractions = info.args.iter().zip(&arg_idents).map(|(arg, ident)| {
        let name = &arg.name;
        match &arg.kind {
            ArgKind::All => quote! { let #ident = ::core::clone::Clone::clone(&__jsontools_params); },
            ArgKind::Optional(ty) => {
                quote! { let #ident = __jsontools_params.optional::<#ty>(#name)?; }
            }
            ArgKind::Required(ty) => {
                quote! { let #ident = __jsontools_params.required::<#ty>(#name)?; }
            }
        }
    });

    let mut call = quote! { self.#fn_name(#(#arg_idents),*) };
    if info.is_async {
        call = quote! { #call.await };
    }
    if info.returns_result {
        call = quote! { #call? };
    }

    quote! {
        #[doc(hidden)]
        fn #wrapper(
            &self,
            __jsontools_params: ::jsontools::RouteParams,
        ) -> ::jsontools::HandlerFuture<'_> {
            ::std::boxed::Box::pin(async move {
                #(#extractions)*
                let __jsontools_rv = #call;
                ::core::result::Result::<_, ::jsontools::JsonToolsError>::Ok(
                    ::jsontools::axum::response::IntoResponse::into_response(__jsontools_rv),
                )
            })
        }
    }
}

fn wrapper_ident(fn_name: &syn::Ident) -> syn::Ident {
    format_ident!("__jsontools_view_{}", fn_name.unraw())
}

fn is_methodview_attr(attr: &Attribute) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "methodview")
}

fn parse_methodview(attr: &Attribute) -> syn::Result<MethodViewArgs> {
    match &attr.meta {
        syn::Meta::Path(_) => Ok(MethodViewArgs::default()),
        _ => attr.parse_args(),
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last(),
        _ => None,
    }
}

fn arg_kind(ty: &Type) -> ArgKind {
    let Some(segment) = last_segment(ty) else {
        return ArgKind::Required(ty.clone());
    };
    if segment.ident == "RouteParams" {
        return ArgKind::All;
    }
    if segment.ident == "Option" {
        if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
            if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                return ArgKind::Optional(inner.clone());
            }
        }
    }
    ArgKind::Required(ty.clone())
}

fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => last_segment(ty).is_some_and(|s| s.ident == "Result"),
        ReturnType::Default => false,
    }
}

fn type_name(ty: &Type) -> String {
    match last_segment(ty) {
        Some(segment) => segment.ident.unraw().to_string(),
        None => quote!(#ty).to_string(),
    }
}
