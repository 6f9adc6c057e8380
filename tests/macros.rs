use meshwire::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

trait UserRepository: Send + Sync {
    fn find(&self, id: u32) -> Option<String>;
}

#[derive(Injectable)]
pub struct MemoryUserRepository {}

impl UserRepository for MemoryUserRepository {
    fn find(&self, id: u32) -> Option<String> {
        (id == 1).then(|| "alice".to_string())
    }
}

#[derive(Injectable)]
pub struct CachedUserRepository {}

impl UserRepository for CachedUserRepository {
    fn find(&self, _id: u32) -> Option<String> {
        Some("cached".to_string())
    }
}

#[derive(Injectable)]
pub struct Settings;

#[derive(Injectable)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    #[allow(unused)]
    settings: Arc<Settings>,
    #[inject(default)]
    lookups: AtomicUsize,
}

impl UserService {
    fn name_of(&self, id: u32) -> Option<String> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.repository.find(id)
    }
}

#[derive(Injectable)]
pub struct ReportService {
    #[inject(name = "replica")]
    repository: Arc<MemoryUserRepository>,
}

#[module(providers = [Settings])]
pub struct SettingsModule;

#[module(
    imports = [SettingsModule],
    providers = [MemoryUserRepository, UserService],
    bindings = [(dyn UserRepository => MemoryUserRepository)],
)]
pub struct UserModule;

#[module(providers = [UserService])]
pub struct BrokenModule;

#[test]
fn test_injectable_dependencies() {
    assert_eq!(
        <UserService as Injectable>::dependencies(),
        vec![Key::of::<dyn UserRepository>(), Key::of::<Settings>()]
    );
    assert_eq!(
        <ReportService as Injectable>::dependencies(),
        vec![Key::named::<MemoryUserRepository>("replica")]
    );
    assert!(<Settings as Injectable>::dependencies().is_empty());
}

#[test]
fn test_module_container() {
    let container = UserModule::create_container().unwrap();
    assert_eq!(container.len(), 3);

    let service = container.resolve::<UserService>().unwrap();
    assert_eq!(service.name_of(1).as_deref(), Some("alice"));
    assert_eq!(service.name_of(2), None);
    assert_eq!(service.lookups.load(Ordering::Relaxed), 2);

    let repository = container.resolve::<dyn UserRepository>().unwrap();
    assert!(std::ptr::addr_eq(
        Arc::as_ptr(&repository),
        Arc::as_ptr(&service.repository)
    ));
}

#[test]
fn test_module_directives_order() {
    let directives = UserModule::directives();
    assert!(matches!(directives[0], Directive::Package(_)));
    assert_eq!(directives.len(), 5);
}

#[test]
fn test_module_with_builder() {
    let container = Container::builder()
        .module::<UserModule>()
        .provide(Provide::injectable::<MemoryUserRepository>().name("replica"))
        .provide(Provide::injectable::<ReportService>())
        .build()
        .unwrap();

    let report = container.resolve::<ReportService>().unwrap();
    let default = container.resolve::<MemoryUserRepository>().unwrap();
    assert!(!Arc::ptr_eq(&report.repository, &default));
}

#[test]
fn test_named_field_unsatisfied() {
    let result = Container::builder()
        .provide(Provide::injectable::<MemoryUserRepository>())
        .provide(Provide::injectable::<ReportService>())
        .build();

    match result {
        Err(MeshwireError::UnsatisfiedDependency {
            requesting,
            missing,
        }) => {
            assert_eq!(requesting, Key::of::<ReportService>());
            assert_eq!(missing, Key::named::<MemoryUserRepository>("replica"));
        }
        other => panic!("expected UnsatisfiedDependency, got {:?}", other.err()),
    }
}

#[test]
fn test_module_missing_import() {
    let error = BrokenModule::create_container().unwrap_err();
    assert_eq!(error.key(), Some(&Key::of::<UserService>()));
}

#[test]
fn test_module_binding_wins_over_later_as() {
    let container = Container::builder()
        .module::<UserModule>()
        .capability(capability!(dyn UserRepository => CachedUserRepository))
        .provide(Provide::injectable::<CachedUserRepository>().as_::<dyn UserRepository>())
        .build()
        .unwrap();

    let service = container.resolve::<UserService>().unwrap();
    assert_eq!(service.name_of(1).as_deref(), Some("alice"));
}
