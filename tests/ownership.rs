use std::cell::Cell;
use std::rc::Rc;

use ode::backend::recording::{Call, RecordingApi};
use ode::handle::ResourceKind;
use ode::prelude::*;
use ode::{Body, Error, NativeHandle, Ode, Ownership, RawHandle, Space, World};

fn setup() -> (Rc<RecordingApi>, Ode) {
    let _ = env_logger::builder().is_test(true).try_init();
    let api = Rc::new(RecordingApi::default());
    let ode = Ode::config().backend(api.clone()).build().unwrap();
    (api, ode)
}

fn destroyed(api: &RecordingApi, kind: ResourceKind) -> usize {
    api.calls()
        .iter()
        .filter(|call| match call {
            Call::Destroy { kind: k, .. } => *k == kind,
            _ => false,
        })
        .count()
}

#[test]
fn world_teardown_skips_body_release() {
    let (api, ode) = setup();
    let mut world = World::new(&ode).unwrap();
    let mut a = world.create_body().unwrap();
    let b = world.create_body().unwrap();

    assert!(!a.is_world_closed());
    world.close();
    assert!(a.is_world_closed());

    a.close();
    a.close();
    drop(b);

    assert_eq!(1, destroyed(&api, ResourceKind::World));
    assert_eq!(0, destroyed(&api, ResourceKind::Body));
    assert_eq!(0, api.live_count());
}

#[test]
fn bodies_released_before_world_are_destroyed() {
    let (api, ode) = setup();
    let world = World::new(&ode).unwrap();
    let body = Body::new(&world).unwrap();
    let id = body.raw().id().unwrap();

    drop(body);
    assert!(!api.is_live(id));
    assert!(!world.is_closed());

    drop(world);
    assert_eq!(1, destroyed(&api, ResourceKind::Body));
    assert_eq!(1, destroyed(&api, ResourceKind::World));
}

#[test]
fn dropping_the_world_first_is_safe() {
    let (api, ode) = setup();
    let world = World::new(&ode).unwrap();
    let body = world.create_body().unwrap();

    // the body holds no strong reference to the world
    drop(world);
    assert!(body.is_world_closed());
    drop(body);

    assert_eq!(0, destroyed(&api, ResourceKind::Body));
}

#[test]
fn body_in_closed_world_is_rejected() {
    let (_api, ode) = setup();
    let mut world = World::new(&ode).unwrap();
    world.close();

    assert_eq!(RawHandle::Absent, world.raw());
    match Body::new(&world) {
        Err(Error::ContractViolation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

struct StubOwner {
    closed: Cell<bool>,
}

impl OwnerState for StubOwner {
    fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

#[test]
fn closed_stub_owner_suppresses_destroy() {
    let (api, ode) = setup();
    let owner = Rc::new(StubOwner {
        closed: Cell::new(false),
    });
    let id = api.trimesh_data_create().unwrap();
    let mut handle =
        unsafe { NativeHandle::from_raw(&ode, ResourceKind::TriMeshData, id, Ownership::owned_by(&owner)) };

    owner.closed.set(true);
    handle.close();
    handle.close();

    assert_eq!(0, api.destroy_calls());
    assert!(handle.is_closed());
    assert!(!handle.is_owned());
}

#[test]
fn top_level_space_gets_null_parent() {
    let (api, ode) = setup();
    let root = Space::simple(&ode, None).unwrap();
    let child = Space::hash(&ode, Some(&root)).unwrap();

    let parents: Vec<RawHandle> = api
        .calls()
        .iter()
        .filter_map(|call| match call {
            Call::Create {
                kind: ResourceKind::Space,
                parent,
                ..
            } => Some(*parent),
            _ => None,
        })
        .collect();

    assert_eq!(vec![RawHandle::null(), root.raw()], parents);
    assert!(child.handle().is_owned());
    assert!(!root.handle().is_owned());
}

#[test]
fn parent_space_cleanup_covers_children() {
    let (api, ode) = setup();
    let mut root = Space::simple(&ode, None).unwrap();
    let mid = Space::simple(&ode, Some(&root)).unwrap();
    let leaf = Space::hash(&ode, Some(&mid)).unwrap();

    root.close();
    drop(leaf);
    drop(mid);

    assert_eq!(1, destroyed(&api, ResourceKind::Space));
    assert_eq!(0, api.live_count());

    match Space::simple(&ode, Some(&root)) {
        Err(Error::ContractViolation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn spaces_freed_by_a_grandparent_report_no_identifier() {
    let (api, ode) = setup();
    let mut root = Space::simple(&ode, None).unwrap();
    let mid = Space::simple(&ode, Some(&root)).unwrap();
    let leaf = Space::simple(&ode, Some(&mid)).unwrap();

    root.close();

    assert!(!mid.is_closed());
    assert!(mid.raw().is_absent());
    assert!(leaf.handle().is_owner_closed());
    match Space::hash(&ode, Some(&mid)) {
        Err(Error::ContractViolation(_)) => {}
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(0, api.live_count());
}
