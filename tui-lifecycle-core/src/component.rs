//! Component definitions
//!
//! A [`Component`] is the reusable description (view, update policy,
//! lifecycle effects, optional adapter); a [`Host`] is one mounted
//! instance of it. Mounting creates a fresh context per host, so one
//! component can be mounted many times.
//!
//! # Example
//!
//! ```ignore
//! let counter = Component::new("counter", view_builder(|count: &i32, _, _| {
//!         Paragraph::new(format!("{count}"))
//!     }))
//!     .on_lifecycle(|event, ctx| {
//!         if event == Lifecycle::Init {
//!             ctx.dispatch(Action::Load);
//!         }
//!     })
//!     .adapter(Adapter::connect("history", &history_store));
//!
//! let host = counter.mount(&store, Rc::new(scheduler.clone()));
//! ```

use std::fmt;
use std::rc::Rc;

use crate::context::{Context, LifecycleHandler, LogicContext};
use crate::debug::DebugConfig;
use crate::host::{Host, HostBuilder};
use crate::lifecycle::Lifecycle;
use crate::policy::UpdatePolicy;
use crate::report::{SharedReporter, TracingReporter};
use crate::scheduler::SharedScheduler;
use crate::store::StoreApi;
use crate::view::{ViewBuilder, ViewEnhance};

type ContextFactory<S, A> = Rc<dyn Fn() -> LogicContext<S, A>>;

/// Sidecar logic embedded in a component
///
/// An adapter gets its own context (possibly bound to another store) that
/// is merged into the component's context at mount time. It sees every
/// observer registration, lifecycle event and disposal of the host, but
/// state reads and plain dispatch stay with the component.
pub struct Adapter<S, A> {
    name: Rc<str>,
    connect: ContextFactory<S, A>,
    on_lifecycle: Option<LifecycleHandler<S, A>>,
}

impl<S: 'static, A: 'static> Adapter<S, A> {
    /// Adapter whose context reads, dispatches and subscribes through `store`
    pub fn connect<St>(name: impl Into<Rc<str>>, store: &St) -> Self
    where
        St: StoreApi<S, A> + Clone + 'static,
    {
        let name = name.into();
        let store = store.clone();
        let context_name = Rc::clone(&name);
        Self {
            name,
            connect: Rc::new(move || LogicContext::connect(Rc::clone(&context_name), &store)),
            on_lifecycle: None,
        }
    }

    /// Adapter built from a custom context factory
    pub fn from_factory(
        name: impl Into<Rc<str>>,
        factory: impl Fn() -> LogicContext<S, A> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            connect: Rc::new(factory),
            on_lifecycle: None,
        }
    }

    /// Lifecycle effects of the adapter
    pub fn on_lifecycle(mut self, handler: impl Fn(Lifecycle, &LogicContext<S, A>) + 'static) -> Self {
        self.on_lifecycle = Some(Rc::new(handler));
        self
    }

    /// Adapter name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn create_context(&self) -> LogicContext<S, A> {
        let ctx = (self.connect)();
        match &self.on_lifecycle {
            Some(handler) => {
                let handler = Rc::clone(handler);
                ctx.with_lifecycle(move |event, ctx| handler(event, ctx))
            }
            None => ctx,
        }
    }
}

impl<S, A> fmt::Debug for Adapter<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("has_lifecycle", &self.on_lifecycle.is_some())
            .finish()
    }
}

/// Reusable component description
pub struct Component<S, A, O> {
    name: Rc<str>,
    view: ViewBuilder<S, A, O>,
    policy: UpdatePolicy<S>,
    on_lifecycle: Option<LifecycleHandler<S, A>>,
    adapter: Option<Adapter<S, A>>,
    enhance: Option<ViewEnhance<S, A, O>>,
    reporter: SharedReporter,
    debug: DebugConfig,
}

impl<S: 'static, A: 'static, O: Clone + 'static> Component<S, A, O> {
    /// A component with the default identity update policy
    pub fn new(name: impl Into<Rc<str>>, view: ViewBuilder<S, A, O>) -> Self {
        Self {
            name: name.into(),
            view,
            policy: UpdatePolicy::default(),
            on_lifecycle: None,
            adapter: None,
            enhance: None,
            reporter: Rc::new(TracingReporter),
            debug: DebugConfig::default(),
        }
    }

    /// Replace the update policy
    pub fn should_update(mut self, policy: UpdatePolicy<S>) -> Self {
        self.policy = policy;
        self
    }

    /// Lifecycle effects of the component itself
    pub fn on_lifecycle(mut self, handler: impl Fn(Lifecycle, &LogicContext<S, A>) + 'static) -> Self {
        self.on_lifecycle = Some(Rc::new(handler));
        self
    }

    /// Embed sidecar logic
    pub fn adapter(mut self, adapter: Adapter<S, A>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Wrap the view builder at mount time
    pub fn view_enhance(mut self, enhance: ViewEnhance<S, A, O>) -> Self {
        self.enhance = Some(enhance);
        self
    }

    /// Where hosts report scheduling failures and debug builds
    pub fn reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Debug switches for hosts
    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mount a host whose state is the whole state of `store`
    pub fn mount<St>(&self, store: &St, scheduler: SharedScheduler) -> Host<S, A, O>
    where
        St: StoreApi<S, A> + Clone + 'static,
    {
        self.mount_with(LogicContext::connect(Rc::clone(&self.name), store), scheduler)
    }

    /// Mount a host around a caller-built main context
    ///
    /// Use this when the component reads a slice of a larger state through
    /// a typed accessor (see [`LogicContext::new`]).
    pub fn mount_with(&self, main: LogicContext<S, A>, scheduler: SharedScheduler) -> Host<S, A, O> {
        let main = match &self.on_lifecycle {
            Some(handler) => {
                let handler = Rc::clone(handler);
                main.with_lifecycle(move |event, ctx| handler(event, ctx))
            }
            None => main,
        };
        let sidecar = self.adapter.as_ref().map(Adapter::create_context);
        let ctx = Context::merge(main, sidecar);

        let mut builder = HostBuilder::new(Rc::clone(&self.view), scheduler)
            .policy(self.policy.clone())
            .reporter(Rc::clone(&self.reporter))
            .debug(self.debug.clone());
        if let Some(enhance) = &self.enhance {
            builder = builder.view_enhance(Rc::clone(enhance));
        }
        builder.mount(ctx)
    }
}

impl<S, A, O> fmt::Debug for Component<S, A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingStore, LifecycleLog, RecordingScheduler};
    use crate::view::view_builder;

    fn label() -> ViewBuilder<i32, &'static str, String> {
        view_builder(|state: &i32, _dispatch: &dyn Fn(&'static str), _ctx: &Context<i32, &'static str>| {
            format!("value={state}")
        })
    }

    #[test]
    fn test_adapter_shares_lifecycle_and_teardown() {
        let main_store = CountingStore::new(1);
        let side_store = CountingStore::new(50);
        let log = LifecycleLog::new();
        let component = Component::new("panel", label())
            .on_lifecycle(log.handler())
            .adapter(Adapter::connect("history", &side_store).on_lifecycle(log.handler()));
        let scheduler = RecordingScheduler::new();

        let host = component.mount(&main_store, scheduler.shared());
        assert_eq!(host.build(), "value=1");
        assert_eq!(main_store.subscribe_count(), 1);
        assert_eq!(side_store.subscribe_count(), 1);

        host.dispose();
        host.dispose();

        assert_eq!(main_store.unsubscribe_count(), 1);
        assert_eq!(side_store.unsubscribe_count(), 1);
        assert_eq!(
            log.entries(),
            vec![
                ("panel".to_string(), Lifecycle::Init),
                ("history".to_string(), Lifecycle::Init),
                ("panel".to_string(), Lifecycle::Build),
                ("history".to_string(), Lifecycle::Build),
                ("panel".to_string(), Lifecycle::Dispose),
                ("history".to_string(), Lifecycle::Dispose),
            ]
        );
    }

    #[test]
    fn test_sidecar_broadcast_triggers_main_check() {
        let main_store = CountingStore::new(1);
        let side_store = CountingStore::new(50);
        let component = Component::new("panel", label())
            .adapter(Adapter::connect("history", &side_store));
        let scheduler = RecordingScheduler::new();
        let host = component.mount(&main_store, scheduler.shared());
        host.build();

        // Sidecar broadcasts re-check main's state, which has not moved
        side_store.emit(51);
        assert_eq!(scheduler.request_count(), 0);

        main_store.emit(2);
        assert_eq!(scheduler.request_count(), 1);
        assert_eq!(host.build(), "value=2");
    }

    #[test]
    fn test_each_mount_gets_fresh_context() {
        let store = CountingStore::new(3);
        let component = Component::new("cell", label()).should_update(UpdatePolicy::Always);
        let scheduler = RecordingScheduler::new();

        let a = component.mount(&store, scheduler.shared());
        let b = component.mount(&store, scheduler.shared());
        assert_ne!(a.id(), b.id());
        assert_eq!(store.subscribe_count(), 2);

        a.dispose();
        assert!(a.context().is_disposed());
        assert!(!b.context().is_disposed());
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_mount_with_typed_slice() {
        let store = CountingStore::<(i32, String), &'static str>::new((8, "ignored".into()));
        let reader = store.clone();
        let subscriber = store.clone();
        let main = LogicContext::new(
            "slice",
            move || Rc::new(reader.state().0),
            |_action: &'static str| {},
            move |listener| subscriber.subscribe(listener),
        );
        let scheduler = RecordingScheduler::new();
        // Every read allocates a fresh slice, so compare by value
        let host = Component::new("slice", label())
            .should_update(UpdatePolicy::by_value())
            .mount_with(main, scheduler.shared());

        assert_eq!(host.build(), "value=8");

        store.emit((8, "changed".into()));
        assert_eq!(scheduler.request_count(), 0);

        store.emit((9, "changed".into()));
        assert_eq!(scheduler.request_count(), 1);
        assert_eq!(host.build(), "value=9");
    }
}
