use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, LitStr, Token};

/// A single string or a bracketed list of strings: `"id"` / `["a", "b"]`.
pub struct Names(pub Vec<LitStr>);

impl Parse for Names {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(syn::token::Bracket) {
            let content;
            syn::bracketed!(content in input);
            let items = content.parse_terminated(<LitStr as Parse>::parse, Token![,])?;
            Ok(Names(items.into_iter().collect()))
        } else {
            Ok(Names(vec![input.parse()?]))
        }
    }
}

impl Names {
    fn check_not_blank(&self, what: &str) -> syn::Result<()> {
        for lit in &self.0 {
            if lit.value().trim().is_empty() {
                return Err(syn::Error::new(lit.span(), format!("{what} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Arguments of `#[methodview(verbs, if_set = .., if_not_set = ..)]`.
#[derive(Default)]
pub struct MethodViewArgs {
    verbs: Option<Names>,
    if_set: Option<Names>,
    if_not_set: Option<Names>,
}

impl Parse for MethodViewArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = MethodViewArgs::default();

        // Verbs come first and are positional.
        if input.peek(LitStr) || input.peek(syn::token::Bracket) {
            let verbs: Names = input.parse()?;
            verbs.check_not_blank("HTTP verb")?;
            args.verbs = Some(verbs);
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let names: Names = input.parse()?;
            names.check_not_blank("route param name")?;

            if name == "if_set" {
                args.if_set = Some(names);
            } else if name == "if_not_set" {
                args.if_not_set = Some(names);
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "unknown methodview argument, expected `if_set` or `if_not_set`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

impl MethodViewArgs {
    /// Expression building the matching `HandlerDeclaration`.
    pub fn declaration(&self) -> TokenStream2 {
        let mut decl = quote! { ::jsontools::HandlerDeclaration::new() };
        let axes = [
            (&self.verbs, quote! { verbs }),
            (&self.if_set, quote! { requires_present }),
            (&self.if_not_set, quote! { requires_absent }),
        ];
        for (names, method) in axes {
            // an empty list means unconstrained, same as leaving it out
            if let Some(Names(lits)) = names {
                if !lits.is_empty() {
                    decl = quote! { #decl.#method([#(#lits),*]) };
                }
            }
        }
        decl
    }
}

/// `#[methodview]` outside `#[view]`: validate the arguments, leave the item alone.
pub fn methodview_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let _args = parse_macro_input!(attr as MethodViewArgs);
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(names: &Option<Names>) -> Vec<String> {
        names
            .as_ref()
            .map(|Names(lits)| lits.iter().map(LitStr::value).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_names_single_and_list() {
        let single: Names = syn::parse_str(r#""id""#).unwrap();
        assert_eq!(single.0.len(), 1);

        let list: Names = syn::parse_str(r#"["org", "team", "id",]"#).unwrap();
        let list: Vec<String> = list.0.iter().map(LitStr::value).collect();
        assert_eq!(list, ["org", "team", "id"]);
    }

    #[test]
    fn test_methodview_args() {
        let args: MethodViewArgs =
            syn::parse_str(r#"["GET", "CUSTOM"], if_set = "org", if_not_set = ["team", "id"]"#).unwrap();
        assert_eq!(values(&args.verbs), ["GET", "CUSTOM"]);
        assert_eq!(values(&args.if_set), ["org"]);
        assert_eq!(values(&args.if_not_set), ["team", "id"]);

        let bare: MethodViewArgs = syn::parse_str("").unwrap();
        assert!(bare.verbs.is_none());
    }

    #[test]
    fn test_methodview_args_rejected() {
        assert!(syn::parse_str::<MethodViewArgs>(r#""GET", when = "id""#).is_err());
        assert!(syn::parse_str::<MethodViewArgs>(r#"["GET", " "]"#).is_err());
        assert!(syn::parse_str::<MethodViewArgs>(r#""GET", if_set = [""]"#).is_err());
    }
}
