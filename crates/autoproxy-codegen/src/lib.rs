// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, FnArg, GenericArgument, ItemTrait, LitStr, Pat, PathArguments, ReturnType,
    TraitItem, TraitItemFn, Type,
};

/// How a contract member is dispatched.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Property,
    Method,
}

struct MemberInfo {
    func: TraitItemFn,
    kind: MemberKind,
    remote_name: String,
    params: Vec<(syn::Ident, Type)>,
    ret: Type,
}

#[derive(Default)]
struct ContractArgs {
    name: Option<LitStr>,
    iterable: Option<Type>,
}

/// `#[contract]`: turns a trait into a remote contract and generates its proxy.
///
/// For `trait Foo` the macro emits `FooProxy`, a cloneable typed proxy that
/// implements `Foo` by dispatching every call through a `Proxy`.
///
/// Attribute arguments:
/// - `name = "..."`: contract name (defaults to the trait name)
/// - `iterable = T`: element type; adds `FooProxy::iter()`
///
/// Members:
/// - `#[property]` / `#[property(name = "...")]`: named get, no parameters
/// - `#[method(name = "...")]` or no attribute: named call
///
/// Remote names default to the PascalCase form of the Rust name
/// (`display_name` -> `DisplayName`). Every member takes `&self` and returns
/// `autoproxy::Result<T>`.
///
/// Example:
/// ```ignore
/// use autoproxy::{contract, Result};
///
/// #[contract(iterable = ServiceProxy)]
/// pub trait ServiceSet {
///     #[property]
///     fn count(&self) -> Result<i32>;
///     #[method(name = "ItemIndex")]
///     fn item(&self, index: i32) -> Result<ServiceProxy>;
/// }
/// ```
#[proc_macro_attribute]
pub fn contract(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ContractArgs::default();
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("iterable") {
            args.iterable = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("expected `name = \"...\"` or `iterable = Type`"))
        }
    });
    parse_macro_input!(attr with parser);

    let mut item = parse_macro_input!(item as ItemTrait);
    match expand(&args, &mut item) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(args: &ContractArgs, item: &mut ItemTrait) -> syn::Result<proc_macro2::TokenStream> {
    if !item.generics.params.is_empty() || item.generics.where_clause.is_some() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "contracts cannot be generic",
        ));
    }

    let mut members = Vec::new();
    for trait_item in &mut item.items {
        let TraitItem::Fn(func) = trait_item else {
            return Err(syn::Error::new_spanned(
                trait_item,
                "contracts may only contain methods",
            ));
        };
        members.push(parse_member(func)?);
    }

    let trait_ident = &item.ident;
    let vis = &item.vis;
    let proxy_ident = format_ident!("{}Proxy", trait_ident);
    let contract_name = args
        .name
        .as_ref()
        .map_or_else(|| trait_ident.to_string(), LitStr::value);

    // Descriptor entries, in declaration order
    let descriptors: Vec<_> = members
        .iter()
        .map(|m| {
            let name = &m.remote_name;
            let ret = static_lifetimes(&m.ret);
            match m.kind {
                MemberKind::Property => quote! {
                    ::autoproxy::MemberDescriptor {
                        name: #name,
                        kind: ::autoproxy::MemberKind::Property,
                        params: &[],
                        returns: <#ret as ::autoproxy::FromValue>::TYPE,
                    }
                },
                MemberKind::Method => {
                    let params = m.params.iter().map(|(_, ty)| {
                        let ty = static_lifetimes(ty);
                        quote! { <#ty as ::autoproxy::IntoValue>::TYPE }
                    });
                    quote! {
                        ::autoproxy::MemberDescriptor {
                            name: #name,
                            kind: ::autoproxy::MemberKind::Method,
                            params: &[#(#params),*],
                            returns: <#ret as ::autoproxy::FromValue>::TYPE,
                        }
                    }
                }
            }
        })
        .collect();

    let element = match &args.iterable {
        Some(ty) => quote! { Some(<#ty as ::autoproxy::FromValue>::TYPE) },
        None => quote! { None },
    };

    // Trait implementation: each body forwards to the gateway by member index
    let bodies: Vec<_> = members
        .iter()
        .enumerate()
        .map(|(idx, m)| {
            let sig = &m.func.sig;
            let ret = &m.ret;
            let idx = proc_macro2::Literal::usize_unsuffixed(idx);
            let arg_names = m.params.iter().map(|(ident, _)| ident);
            quote! {
                #sig {
                    let value = self.proxy.invoke(
                        &<Self as ::autoproxy::TypedProxy>::contract().members[#idx],
                        vec![#(::autoproxy::IntoValue::into_value(#arg_names)),*],
                    )?;
                    <#ret as ::autoproxy::FromValue>::from_value(value)
                }
            }
        })
        .collect();

    let iter_fn = args.iterable.as_ref().map(|ty| {
        quote! {
            impl #proxy_ident {
                /// Iterate the remote collection. Each call opens a fresh enumerator.
                pub fn iter(&self) -> ::autoproxy::Result<::autoproxy::Elements<#ty>> {
                    self.proxy.elements()
                }
            }
        }
    });

    let proxy_doc = format!("Typed proxy implementing [`{trait_ident}`] over a remote object.");

    Ok(quote! {
        #item

        #[doc = #proxy_doc]
        #[derive(Clone)]
        #vis struct #proxy_ident {
            proxy: ::autoproxy::Proxy,
        }

        impl ::autoproxy::TypedProxy for #proxy_ident {
            fn contract() -> &'static ::autoproxy::ContractDescriptor {
                static CONTRACT: ::autoproxy::ContractDescriptor = ::autoproxy::ContractDescriptor {
                    name: #contract_name,
                    members: &[#(#descriptors),*],
                    element: #element,
                };
                &CONTRACT
            }

            fn from_proxy(proxy: ::autoproxy::Proxy) -> Self {
                Self { proxy }
            }

            fn as_proxy(&self) -> &::autoproxy::Proxy {
                &self.proxy
            }

            fn into_proxy(self) -> ::autoproxy::Proxy {
                self.proxy
            }
        }

        impl #trait_ident for #proxy_ident {
            #(#bodies)*
        }

        #iter_fn

        impl ::core::ops::Deref for #proxy_ident {
            type Target = ::autoproxy::Proxy;

            fn deref(&self) -> &::autoproxy::Proxy {
                &self.proxy
            }
        }

        impl ::core::fmt::Debug for #proxy_ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(stringify!(#proxy_ident)).field(&self.proxy).finish()
            }
        }

        impl ::autoproxy::FromValue for #proxy_ident {
            const TYPE: ::autoproxy::ValueType =
                ::autoproxy::ValueType::Contract(::autoproxy::ContractRef::of::<#proxy_ident>());

            fn from_value(value: ::autoproxy::Value) -> ::autoproxy::Result<Self> {
                ::autoproxy::contract::proxy_from_value(value)
            }
        }

        impl ::autoproxy::IntoValue for #proxy_ident {
            const TYPE: ::autoproxy::ValueType =
                ::autoproxy::ValueType::Contract(::autoproxy::ContractRef::of::<#proxy_ident>());

            fn into_value(self) -> ::autoproxy::Value {
                ::autoproxy::Value::Proxy(self.proxy)
            }
        }

        impl ::autoproxy::IntoValue for &#proxy_ident {
            const TYPE: ::autoproxy::ValueType =
                ::autoproxy::ValueType::Contract(::autoproxy::ContractRef::of::<#proxy_ident>());

            fn into_value(self) -> ::autoproxy::Value {
                ::autoproxy::Value::Proxy(self.proxy.clone())
            }
        }
    })
}

/// Classify one trait method and strip its member attribute.
fn parse_member(func: &mut TraitItemFn) -> syn::Result<MemberInfo> {
    let mut kind = MemberKind::Method;
    let mut remote_name = None;
    let mut marked = false;

    let mut error = None;
    func.attrs.retain(|attr| {
        let this_kind = if attr.path().is_ident("property") {
            MemberKind::Property
        } else if attr.path().is_ident("method") {
            MemberKind::Method
        } else {
            return true;
        };
        if marked {
            error = Some(syn::Error::new_spanned(attr, "duplicate member attribute"));
            return false;
        }
        marked = true;
        kind = this_kind;
        if matches!(attr.meta, syn::Meta::List(_)) {
            let res = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    remote_name = Some(meta.value()?.parse::<LitStr>()?.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `name = \"...\"`"))
                }
            });
            if let Err(e) = res {
                error = Some(e);
            }
        }
        false
    });
    if let Some(e) = error {
        return Err(e);
    }

    let sig = &func.sig;
    if func.default.is_some() {
        return Err(syn::Error::new_spanned(
            &func.default,
            "contract members cannot have a default body",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "contract members cannot be generic",
        ));
    }
    if sig.asyncness.is_some() || sig.unsafety.is_some() {
        return Err(syn::Error::new_spanned(
            sig,
            "contract members must be plain synchronous methods",
        ));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(r)) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "contract members must take `&self`",
            ))
        }
    }

    let mut params = Vec::new();
    for input in inputs {
        let FnArg::Typed(pat_ty) = input else {
            return Err(syn::Error::new_spanned(input, "unexpected receiver"));
        };
        let Pat::Ident(pat) = pat_ty.pat.as_ref() else {
            return Err(syn::Error::new_spanned(
                &pat_ty.pat,
                "contract parameters must be plain identifiers",
            ));
        };
        params.push((pat.ident.clone(), (*pat_ty.ty).clone()));
    }

    if kind == MemberKind::Property && !params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "properties take no parameters",
        ));
    }

    let Some(ret) = result_inner(&sig.output) else {
        return Err(syn::Error::new_spanned(
            &sig.output,
            "contract members must return `Result<T>`",
        ));
    };

    let remote_name = remote_name.unwrap_or_else(|| pascal_case(&sig.ident.to_string()));

    Ok(MemberInfo {
        func: func.clone(),
        kind,
        remote_name,
        params,
        ret,
    })
}

/// `T` out of `-> Result<T>` (or any path ending in `Result<T, ..>`).
fn result_inner(output: &ReturnType) -> Option<Type> {
    let ReturnType::Type(_, ty) = output else {
        return None;
    };
    let Type::Path(path) = ty.as_ref() else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner.clone()),
        _ => None,
    }
}

/// Replace elided reference lifetimes with `'static` so the type can appear
/// inside a static initializer.
fn static_lifetimes(ty: &Type) -> Type {
    let mut ty = ty.clone();
    fill_lifetimes(&mut ty);
    ty
}

fn fill_lifetimes(ty: &mut Type) {
    match ty {
        Type::Reference(r) => {
            if r.lifetime.is_none() {
                r.lifetime = Some(syn::Lifetime::new("'static", proc_macro2::Span::call_site()));
            }
            fill_lifetimes(&mut r.elem);
        }
        Type::Path(p) => {
            for seg in &mut p.path.segments {
                if let PathArguments::AngleBracketed(args) = &mut seg.arguments {
                    for arg in &mut args.args {
                        if let GenericArgument::Type(inner) = arg {
                            fill_lifetimes(inner);
                        }
                    }
                }
            }
        }
        Type::Slice(s) => fill_lifetimes(&mut s.elem),
        Type::Array(a) => fill_lifetimes(&mut a.elem),
        Type::Tuple(t) => t.elems.iter_mut().for_each(fill_lifetimes),
        Type::Paren(p) => fill_lifetimes(&mut p.elem),
        Type::Group(g) => fill_lifetimes(&mut g.elem),
        _ => {}
    }
}

/// `exec_query` -> `ExecQuery`
fn pascal_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let mut out = String::with_capacity(ident.len());
    let mut upper = true;
    for c in ident.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_joins_words() {
        assert_eq!(pascal_case("display_name"), "DisplayName");
        assert_eq!(pascal_case("exec_query"), "ExecQuery");
        assert_eq!(pascal_case("count"), "Count");
        assert_eq!(pascal_case("r#type"), "Type");
    }

    #[test]
    fn result_inner_extracts_ok_type() {
        let ret: ReturnType = syn::parse_quote!(-> Result<String>);
        let inner = result_inner(&ret).unwrap();
        assert_eq!(quote!(#inner).to_string(), "String");

        let ret: ReturnType = syn::parse_quote!(-> ::autoproxy::Result<()>);
        assert!(result_inner(&ret).is_some());

        let ret: ReturnType = syn::parse_quote!(-> i32);
        assert!(result_inner(&ret).is_none());
        assert!(result_inner(&ReturnType::Default).is_none());
    }

    #[test]
    fn elided_references_become_static() {
        let ty: Type = syn::parse_quote!(Option<&str>);
        let ty = static_lifetimes(&ty);
        assert!(quote!(#ty).to_string().contains("'static"));
    }

    #[test]
    fn property_attribute_is_stripped_and_named() {
        let mut func: TraitItemFn = syn::parse_quote! {
            #[property(name = "ProcessId")]
            fn pid(&self) -> Result<i32>;
        };
        let member = parse_member(&mut func).unwrap();
        assert!(member.kind == MemberKind::Property);
        assert_eq!(member.remote_name, "ProcessId");
        assert!(func.attrs.is_empty());
    }

    #[test]
    fn unmarked_members_are_methods() {
        let mut func: TraitItemFn = syn::parse_quote! {
            fn stop_service(&self, force: i32) -> Result<i32>;
        };
        let member = parse_member(&mut func).unwrap();
        assert!(member.kind == MemberKind::Method);
        assert_eq!(member.remote_name, "StopService");
        assert_eq!(member.params.len(), 1);
    }

    #[test]
    fn properties_reject_parameters() {
        let mut func: TraitItemFn = syn::parse_quote! {
            #[property]
            fn item(&self, index: i32) -> Result<i32>;
        };
        assert!(parse_member(&mut func).is_err());
    }

    #[test]
    fn members_require_shared_receiver() {
        let mut func: TraitItemFn = syn::parse_quote! {
            fn reset(&mut self) -> Result<()>;
        };
        assert!(parse_member(&mut func).is_err());

        let mut func: TraitItemFn = syn::parse_quote! {
            fn create() -> Result<()>;
        };
        assert!(parse_member(&mut func).is_err());
    }
}
