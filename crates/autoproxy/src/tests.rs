// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway routing through generated proxies.

use crate::session::{ObjectId, Session, SessionOp};
use crate::{
    contract, CapabilityId, Error, LocalObject, LoopbackSession, ObjectHandle, OverrideTable,
    ProxyFactory, Result, TransportError, TypedProxy, Value, ValueType, Variant,
};
use std::sync::Arc;

#[contract(name = "Win32_Service")]
trait Service {
    #[property]
    fn name(&self) -> Result<String>;

    #[property(name = "ProcessId")]
    fn pid(&self) -> Result<i32>;

    fn stop_service(&self) -> Result<i32>;

    #[method(name = "Change")]
    fn change_display_name(&self, display_name: &str) -> Result<i32>;

    fn describe(&self) -> Result<String>;
}

#[contract]
trait Named {
    #[property]
    fn name(&self) -> Result<String>;
}

fn service_object(session: &Arc<LoopbackSession>) -> ObjectHandle {
    session.insert(
        LocalObject::new()
            .property("Name", "Spooler")
            .property("ProcessId", 1880)
            .method("StopService", |_| Ok(Variant::Int(0)))
            .method("Change", |args| {
                assert_eq!(args.len(), 1);
                Ok(Variant::Int(if args[0].as_str().is_ok() { 0 } else { 21 }))
            })
            .method("Describe", |_| Ok(Variant::from("remote description"))),
    )
}

#[test]
fn test_descriptor_lists_members_in_order() {
    let c = ServiceProxy::contract();
    assert_eq!(c.name, "Win32_Service");
    let names: Vec<_> = c.members.iter().map(|m| m.name).collect();
    assert_eq!(
        names,
        ["Name", "ProcessId", "StopService", "Change", "Describe"]
    );
    assert_eq!(c.members[3].params, &[ValueType::Str]);
    assert_eq!(c.members[1].returns, ValueType::Int);
    assert!(!c.is_iterable());
}

#[test]
fn test_property_is_a_single_get() {
    let session = LoopbackSession::recording();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();
    session.reset_counts();

    assert_eq!(svc.pid().unwrap(), 1880);

    let journal = session.journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].op, SessionOp::Get);
    assert_eq!(journal[0].name, "ProcessId");
    assert_eq!(journal[0].arg_count, 0);
}

#[test]
fn test_method_is_a_single_call() {
    let session = LoopbackSession::recording();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();
    session.reset_counts();

    assert_eq!(svc.change_display_name("Print Spooler").unwrap(), 0);

    let counts = session.counts();
    assert_eq!(counts.call, 1);
    assert_eq!(counts.total(), 1);
    assert_eq!(session.journal()[0].name, "Change");
}

#[test]
fn test_unknown_member_is_remote_failure() {
    let session = LoopbackSession::new();
    let obj = session.insert(LocalObject::new());
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();

    let err = svc.stop_service().unwrap_err();
    match err {
        Error::RemoteCallFailure { member, .. } => assert_eq!(member, "StopService"),
        other => panic!("unexpected: {other}"),
    }
}

#[test]
fn test_cast_makes_no_remote_call() {
    let session = LoopbackSession::new();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();
    session.reset_counts();

    let named: NamedProxy = svc.cast().unwrap();
    assert_eq!(session.counts().total(), 0);
    assert_eq!(named.dispatch_handle(), svc.dispatch_handle());
    assert_eq!(named.name().unwrap(), "Spooler");
}

#[test]
fn test_override_replaces_remote_call() {
    let session = LoopbackSession::recording();
    let obj = service_object(&session);
    let factory = ProxyFactory::builder()
        .override_table(OverrideTable::for_proxy::<ServiceProxy>().with(
            "Describe",
            &[],
            |this, _| {
                let svc = ServiceProxy::from_proxy(this.clone());
                Ok(Value::Str(format!("local {}", svc.name()?)))
            },
        ))
        .build();
    let svc: ServiceProxy = factory.wrap_object(&obj).unwrap();
    session.reset_counts();

    assert_eq!(svc.describe().unwrap(), "local Spooler");
    // the override itself read one property; Describe never reached the remote side
    let journal = session.journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].name, "Name");
    assert!(svc.gateway().overrides().is_some());
}

#[test]
fn test_override_with_other_params_does_not_match() {
    let session = LoopbackSession::new();
    let obj = service_object(&session);
    let factory = ProxyFactory::builder()
        .override_table(OverrideTable::for_proxy::<ServiceProxy>().with(
            "Change",
            &[ValueType::Int],
            |_, _| Ok(Value::Int(99)),
        ))
        .build();
    let svc: ServiceProxy = factory.wrap_object(&obj).unwrap();
    session.reset_counts();

    assert_eq!(svc.change_display_name("x").unwrap(), 0);
    assert_eq!(session.counts().call, 1);
}

#[test]
fn test_intrinsics_bypass_marshalling() {
    let session = LoopbackSession::new();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();

    assert_eq!(svc.get("Name").unwrap(), Variant::from("Spooler"));
    svc.put("StartMode", "Manual").unwrap();
    assert_eq!(svc.get("StartMode").unwrap(), Variant::from("Manual"));

    let ret = svc.call("StopService", Vec::new()).unwrap();
    assert_eq!(ret, vec![Variant::Int(0)]);
}

#[test]
fn test_iteration_on_plain_contract_is_rejected() {
    let session = LoopbackSession::new();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();
    session.reset_counts();

    let err = svc.enumerate().err().unwrap();
    assert!(matches!(err, Error::NotIterable { contract: "Win32_Service" }));
    assert_eq!(session.counts().total(), 0);
}

#[test]
fn test_proxy_debug_names_contract() {
    let session = LoopbackSession::new();
    let obj = service_object(&session);
    let svc: ServiceProxy = ProxyFactory::new().wrap_object(&obj).unwrap();
    let dbg = format!("{:?}", svc);
    assert!(dbg.starts_with("ServiceProxy"));
    assert!(dbg.contains("Win32_Service"));
}

type TransportResult<T> = std::result::Result<T, TransportError>;

/// Session whose method replies carry no return slot.
struct SilentSession;

impl Session for SilentSession {
    fn get_property(&self, _: ObjectId, _: &str) -> TransportResult<Variant> {
        Ok(Variant::Empty)
    }

    fn put_property(&self, _: ObjectId, _: &str, _: Variant) -> TransportResult<()> {
        Ok(())
    }

    fn call_method(&self, _: ObjectId, _: &str, _: Vec<Variant>) -> TransportResult<Vec<Variant>> {
        Ok(Vec::new())
    }

    fn query_capability(
        &self,
        target: ObjectId,
        _: CapabilityId,
    ) -> TransportResult<Option<ObjectId>> {
        Ok(Some(target))
    }

    fn fetch_batch(&self, _: ObjectId, _: u32) -> TransportResult<Vec<Variant>> {
        Ok(Vec::new())
    }
}

#[contract]
trait Raw {
    fn fetch(&self) -> Result<Variant>;

    #[method(name = "Fetch")]
    fn fetch_unit(&self) -> Result<()>;
}

#[test]
fn test_method_reply_without_return_value_is_rejected() {
    let obj = ObjectHandle::new(ObjectId(1), Arc::new(SilentSession));
    let raw: RawProxy = ProxyFactory::new().wrap_object(&obj).unwrap();

    for err in [raw.fetch().unwrap_err(), raw.fetch_unit().unwrap_err()] {
        match &err {
            Error::AssertionFailure(msg) => assert!(msg.contains("Fetch"), "{msg}"),
            other => panic!("unexpected: {other}"),
        }
        assert!(err.is_defect());
    }
}
