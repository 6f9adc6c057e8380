use crate::config::{AmbiguityPolicy, ContainerConfig};
use crate::di::binding::BindingRegistry;
use crate::di::builder::{Bind, ContainerBuilder, Directive, Provide};
use crate::di::capability::{CapabilityCatalog, Caster};
use crate::di::definition::{Definition, Edge, NodeId};
use crate::di::observer::Observer;
use crate::di::snapshot::{GraphSnapshot, NodeSnapshot};
use crate::di::{Dependency, Instance, Key, ProviderWrapper, TypeInfo};
use crate::error::{MeshwireError, Result};
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Compiled, thread-safe dependency graph.
///
/// Every definition is linked to its dependencies when the container is
/// built; instances are created lazily on first resolution and cached for
/// the lifetime of the container.
pub struct Container {
    definitions: Vec<Definition>,
    nodes: HashMap<Key, NodeId>,
    bindings: BindingRegistry,
    config: ContainerConfig,
    observer: Arc<dyn Observer>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitStatus {
    Pending,
    Ready,
}

impl Container {
    /// Compile a container from directives.
    pub fn new(directives: impl IntoIterator<Item = Directive>) -> Result<Self> {
        ContainerBuilder::new().directives(directives).build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn compile(
        directives: Vec<Directive>,
        config: ContainerConfig,
        observer: Arc<dyn Observer>,
    ) -> Result<Self> {
        let mut catalog = CapabilityCatalog::default();
        let mut staged = Vec::new();
        flatten(directives, &mut catalog, &mut staged);

        let mut container = Self {
            definitions: Vec::with_capacity(staged.len()),
            nodes: HashMap::with_capacity(staged.len()),
            bindings: BindingRegistry::default(),
            config,
            observer,
        };

        // Every definition exists before any binding, so a `Bind` may name a
        // provider declared after it. Bindings then follow declaration order.
        let mut steps = Vec::with_capacity(staged.len());
        for entry in staged {
            steps.push(match entry {
                Staged::Provide(provide) => BindStep::As(container.register(provide, &catalog)?),
                Staged::Bind(bind) => BindStep::Bind(bind),
            });
        }
        for step in steps {
            match step {
                BindStep::As(casters) => {
                    for (node, capability, caster) in casters {
                        container.implement(node, capability, caster);
                    }
                }
                BindStep::Bind(bind) => container.apply_bind(&bind, &catalog)?,
            }
        }
        container.link()?;
        container.check_cycles()?;

        tracing::info!(
            definitions = container.definitions.len(),
            capabilities = catalog.len(),
            bindings = container.bindings.len(),
            "Container compiled"
        );
        Ok(container)
    }

    /// Adds the definition and returns the casts for its `As` capabilities.
    fn register(
        &mut self,
        provide: Provide,
        catalog: &CapabilityCatalog,
    ) -> Result<Vec<(NodeId, TypeInfo, Caster)>> {
        let (raw, name, capabilities, argument_names) = provide.into_parts();
        let provider = ProviderWrapper::wrap(raw, &argument_names)?;
        let key = Key::new(provider.result(), name);

        if self.nodes.contains_key(&key) {
            return Err(MeshwireError::DuplicateKey { key });
        }

        let node = self.definitions.len();
        let casters = capabilities
            .into_iter()
            .map(|capability| {
                catalog
                    .caster(capability, provider.result())
                    .map(|caster| (node, capability, caster))
            })
            .collect::<Result<Vec<_>>>()?;

        self.observer.registered(&key, provider.kind());
        self.nodes.insert(key.clone(), node);
        self.definitions.push(Definition::new(key, provider));
        Ok(casters)
    }

    fn apply_bind(&mut self, bind: &Bind, catalog: &CapabilityCatalog) -> Result<()> {
        for target in bind.targets() {
            let node = *self
                .nodes
                .get(target)
                .ok_or_else(|| MeshwireError::NotProvided {
                    key: target.clone(),
                })?;
            let caster = catalog.caster(bind.capability(), target.type_info())?;
            self.implement(node, bind.capability(), caster);
        }
        Ok(())
    }

    /// Enters `node` in the binding registry under `capability`, and under the
    /// capability with the node's own name when it has one.
    fn implement(&mut self, node: NodeId, capability: TypeInfo, caster: Caster) {
        let key = Key::new(capability, String::new());
        let definition = &mut self.definitions[node];
        if !definition.add_capability(key.clone()) {
            return;
        }
        let target = definition.key().clone();

        self.bindings.insert(key.clone(), node, Arc::clone(&caster));
        if target.is_named() {
            self.bindings.insert(key.with_name(target.name()), node, caster);
        }
        self.observer.bound(&key, &target);
    }

    fn link(&mut self) -> Result<()> {
        for node in 0..self.definitions.len() {
            let definition = &self.definitions[node];
            let edges = definition
                .provider()
                .arguments()
                .iter()
                .map(|argument| {
                    self.lookup(argument).map_err(|error| match error {
                        MeshwireError::NotProvided { key } => {
                            MeshwireError::UnsatisfiedDependency {
                                requesting: definition.key().clone(),
                                missing: key,
                            }
                        }
                        other => other,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let dependencies: Vec<Key> = edges
                .iter()
                .map(|edge| self.definitions[edge.node].key().clone())
                .collect();
            self.observer.linked(definition.key(), &dependencies);

            self.definitions[node].link(edges);
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<()> {
        let mut status = vec![None; self.definitions.len()];
        let mut path = Vec::new();
        for node in 0..self.definitions.len() {
            self.visit(node, &mut status, &mut path)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        node: NodeId,
        status: &mut [Option<VisitStatus>],
        path: &mut Vec<NodeId>,
    ) -> Result<()> {
        match status[node] {
            Some(VisitStatus::Ready) => return Ok(()),
            Some(VisitStatus::Pending) => {
                let start = path.iter().position(|&n| n == node).unwrap_or(0);
                let cycle = path[start..]
                    .iter()
                    .chain(std::iter::once(&node))
                    .map(|&n| self.definitions[n].key().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(MeshwireError::CircularDependency { cycle });
            }
            None => {}
        }

        status[node] = Some(VisitStatus::Pending);
        path.push(node);
        for edge in self.definitions[node].edges() {
            self.visit(edge.node, status, path)?;
        }
        path.pop();
        status[node] = Some(VisitStatus::Ready);
        Ok(())
    }

    /// Finds the definition for `key`: exact match first, then capability.
    fn lookup(&self, key: &Key) -> Result<Edge> {
        if let Some(&node) = self.nodes.get(key) {
            return Ok(Edge::direct(node));
        }

        let bindings = self.bindings.get(key);
        match bindings {
            [] => Err(MeshwireError::NotProvided { key: key.clone() }),
            [binding] => Ok(Edge::through(binding.node, Arc::clone(&binding.caster))),
            [first, ..] => match self.config.ambiguity {
                AmbiguityPolicy::FirstRegistered => {
                    Ok(Edge::through(first.node, Arc::clone(&first.caster)))
                }
                AmbiguityPolicy::Reject => Err(MeshwireError::AmbiguousCapability {
                    key: key.clone(),
                    candidates: bindings
                        .iter()
                        .map(|binding| self.definitions[binding.node].key().to_string())
                        .collect(),
                }),
            },
        }
    }

    fn instantiate(&self, node: NodeId) -> Result<Instance> {
        let definition = &self.definitions[node];
        definition.get_or_build(|| self.construct(definition))
    }

    fn construct(&self, definition: &Definition) -> Result<Instance> {
        let mut values = Vec::with_capacity(definition.edges().len());
        for (edge, argument) in definition
            .edges()
            .iter()
            .zip(definition.provider().arguments())
        {
            let instance = self.instantiate(edge.node)?;
            values.push(edge.project(&instance, argument)?);
        }

        let started = Instant::now();
        match definition.provider().invoke(values) {
            Ok(instance) => {
                self.observer.constructed(definition.key(), started.elapsed());
                Ok(instance)
            }
            Err(source) => {
                let error = MeshwireError::ConstructionFailed {
                    key: definition.key().clone(),
                    source,
                };
                self.observer.construction_failed(definition.key(), &error);
                Err(error)
            }
        }
    }

    /// Resolve the default instance of `X`, building it and its
    /// dependencies on first use.
    ///
    /// `X` is either a provided type or a capability such as `dyn Logger`.
    pub fn resolve<X: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<X>> {
        self.extract(&Key::of::<X>())
    }

    pub fn resolve_named<X: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<X>> {
        self.extract(&Key::named::<X>(name))
    }

    /// Resolve a key to its type-erased instance.
    pub fn resolve_key(&self, key: &Key) -> Result<Instance> {
        let edge = self.lookup(key)?;
        let instance = self.instantiate(edge.node)?;
        edge.project(&instance, key)
    }

    /// Fill `target` with the default instance of its type.
    pub fn populate<D: Dependency>(&self, target: &mut Option<D>) -> Result<()> {
        self.populate_named(target, "")
    }

    pub fn populate_named<D: Dependency>(&self, target: &mut Option<D>, name: &str) -> Result<()> {
        *target = Some(self.extract(&Key::new(D::type_info(), name))?);
        Ok(())
    }

    fn extract<D: Dependency>(&self, key: &Key) -> Result<D> {
        let instance = self.resolve_key(key)?;
        D::from_instance(&instance).ok_or_else(|| MeshwireError::DowncastFailed {
            type_name: type_name::<D>().to_string(),
        })
    }

    pub fn contains<X: ?Sized + 'static>(&self) -> bool {
        self.contains_key(&Key::of::<X>())
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.nodes.contains_key(key) || !self.bindings.get(key).is_empty()
    }

    /// Keys of all definitions, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.definitions.iter().map(Definition::key)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let nodes = self
            .definitions
            .iter()
            .map(|definition| NodeSnapshot {
                key: definition.key().to_string(),
                kind: definition.provider().kind(),
                implements: definition
                    .implements()
                    .iter()
                    .map(Key::to_string)
                    .collect(),
                dependencies: definition
                    .edges()
                    .iter()
                    .map(|edge| self.definitions[edge.node].key().to_string())
                    .collect(),
                built: definition.is_built(),
            })
            .collect();
        GraphSnapshot { nodes }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

/// A flattened directive, in declaration order.
enum Staged {
    Provide(Provide),
    Bind(Bind),
}

/// A binding to apply once every definition is registered.
enum BindStep {
    /// Capability casts declared with `as_` on a registered provider.
    As(Vec<(NodeId, TypeInfo, Caster)>),
    Bind(Bind),
}

fn flatten(
    directives: Vec<Directive>,
    catalog: &mut CapabilityCatalog,
    staged: &mut Vec<Staged>,
) {
    for directive in directives {
        match directive {
            Directive::Provide(provide) => staged.push(Staged::Provide(provide)),
            Directive::Bind(bind) => staged.push(Staged::Bind(bind)),
            Directive::Capability(descriptor) => catalog.declare(descriptor),
            Directive::Package(nested) => flatten(nested, catalog, staged),
        }
    }
}
