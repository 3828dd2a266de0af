//! End-to-end handler chain scenarios: an application error handler built
//! from independent handlers with a shutdown fallback.

#[cfg(test)]
mod tests {
    use crate::errors::StageResult;
    use crate::events::{CollectingEventSink, EventSink};
    use crate::handling::{ChainExecutor, Disposition, Fallback, FnFallback, Handler, HandlerLink, HandlingContext};
    use crate::testing::{assert_fell_back, assert_handled_by};
    use mockall::predicate::eq;
    use mockall::{automock, mock};
    use pretty_assertions::assert_eq;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    enum AppError {
        ModuleNotFound { name: Option<String> },
        KeyboardInterrupt,
        NotImplemented(String),
        Other(String),
    }

    impl fmt::Display for AppError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::ModuleNotFound { name: Some(name) } => write!(f, "No module named '{name}'"),
                Self::ModuleNotFound { name: None } => write!(f, "No module named <unknown>"),
                Self::KeyboardInterrupt => write!(f, "interrupted"),
                Self::NotImplemented(what) => write!(f, "{what} is not implemented"),
                Self::Other(message) => write!(f, "{message}"),
            }
        }
    }

    #[automock]
    trait PluginLoader: Send + Sync {
        fn try_load_from_plugin(&self, module_name: &str) -> bool;
    }

    mock! {
        Policy {}

        impl Fallback<AppError> for Policy {
            fn on_unhandled(&self, ctx: &mut HandlingContext<AppError>) -> StageResult<()>;
        }
    }

    #[derive(Debug, Default)]
    struct Shutdown {
        calls: AtomicUsize,
    }

    impl Shutdown {
        fn shutdown(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn log_error(log: &dyn EventSink, message: String) {
        log.emit("log.error", Some(serde_json::json!({ "message": message })));
    }

    fn logged_messages(log: &CollectingEventSink) -> Vec<String> {
        log.events_of_type("log.")
            .into_iter()
            .filter_map(|(_, data)| data.and_then(|d| d["message"].as_str().map(str::to_string)))
            .collect()
    }

    struct ModuleNotFoundHandler {
        loader: Arc<dyn PluginLoader>,
        log: Arc<dyn EventSink>,
    }

    impl Handler<AppError> for ModuleNotFoundHandler {
        fn name(&self) -> &str {
            "module_not_found"
        }

        fn accepts(&self, subject: &AppError) -> bool {
            matches!(subject, AppError::ModuleNotFound { .. })
        }

        fn handle(&self, ctx: &mut HandlingContext<AppError>) -> StageResult<()> {
            let AppError::ModuleNotFound { name } = ctx.subject() else {
                return Ok(());
            };
            match name.clone() {
                None => {
                    let message = format!("ModuleNotFoundError without module name: {}", ctx.subject());
                    log_error(self.log.as_ref(), message.clone());
                    ctx.record_anomaly(self.name(), message);
                }
                Some(name) => {
                    if self.loader.try_load_from_plugin(&name) {
                        ctx.mark_handled(self.name());
                    }
                }
            }
            Ok(())
        }
    }

    struct KeyboardInterruptHandler {
        shutdown: Arc<Shutdown>,
    }

    impl Handler<AppError> for KeyboardInterruptHandler {
        fn name(&self) -> &str {
            "keyboard_interrupt"
        }

        fn accepts(&self, subject: &AppError) -> bool {
            matches!(subject, AppError::KeyboardInterrupt)
        }

        fn handle(&self, ctx: &mut HandlingContext<AppError>) -> StageResult<()> {
            self.shutdown.shutdown();
            ctx.mark_handled(self.name());
            Ok(())
        }
    }

    struct NotImplementedHandler {
        shutdown: Arc<Shutdown>,
        log: Arc<dyn EventSink>,
    }

    impl Handler<AppError> for NotImplementedHandler {
        fn name(&self) -> &str {
            "not_implemented"
        }

        fn accepts(&self, subject: &AppError) -> bool {
            matches!(subject, AppError::NotImplemented(_))
        }

        fn handle(&self, ctx: &mut HandlingContext<AppError>) -> StageResult<()> {
            log_error(self.log.as_ref(), format!("NotImplemented error: {}", ctx.subject()));
            self.shutdown.shutdown();
            ctx.mark_handled(self.name());
            Ok(())
        }
    }

    struct UnexpectedHandler {
        shutdown: Arc<Shutdown>,
        log: Arc<dyn EventSink>,
    }

    impl Handler<AppError> for UnexpectedHandler {
        fn name(&self) -> &str {
            "unexpected"
        }

        fn handle(&self, ctx: &mut HandlingContext<AppError>) -> StageResult<()> {
            log_error(self.log.as_ref(), format!("Unexpected exception: {}", ctx.subject()));
            self.shutdown.shutdown();
            ctx.mark_handled(self.name());
            Ok(())
        }
    }

    struct Harness {
        shutdown: Arc<Shutdown>,
        log: Arc<CollectingEventSink>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                shutdown: Arc::new(Shutdown::default()),
                log: Arc::new(CollectingEventSink::new()),
            }
        }

        fn executor<F>(&self, loader: MockPluginLoader, fallback: F) -> ChainExecutor<AppError>
        where
            F: Fallback<AppError> + 'static,
        {
            ChainExecutor::new(fallback)
                .with_name("app_errors")
                .with_handler(ModuleNotFoundHandler {
                    loader: Arc::new(loader),
                    log: self.log.clone(),
                })
                .with_handler(KeyboardInterruptHandler {
                    shutdown: self.shutdown.clone(),
                })
                .with_handler(NotImplementedHandler {
                    shutdown: self.shutdown.clone(),
                    log: self.log.clone(),
                })
                .with_handler(UnexpectedHandler {
                    shutdown: self.shutdown.clone(),
                    log: self.log.clone(),
                })
        }

        fn shutdown_fallback(&self) -> impl Fallback<AppError> {
            let shutdown = self.shutdown.clone();
            FnFallback::new(move |_: &mut HandlingContext<AppError>| {
                shutdown.shutdown();
                Ok(())
            })
        }
    }

    fn idle_loader() -> MockPluginLoader {
        let mut loader = MockPluginLoader::new();
        loader.expect_try_load_from_plugin().never();
        loader
    }

    #[test]
    fn test_nameless_module_error_falls_through_to_unexpected() {
        let harness = Harness::new();
        let mut policy = MockPolicy::new();
        policy.expect_on_unhandled().never();
        let chain = harness.executor(idle_loader(), policy);

        let outcome = chain
            .dispatch(AppError::ModuleNotFound { name: None })
            .unwrap();

        assert_handled_by(&outcome.disposition, "unexpected");
        assert!(outcome.context.is_handled());
        assert_eq!(outcome.context.anomalies().len(), 1);
        assert_eq!(harness.shutdown.calls(), 1);

        let messages = logged_messages(&harness.log);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages.iter().filter(|m| m.starts_with("Unexpected")).count(), 1);
        assert!(messages[0].starts_with("ModuleNotFoundError without module name"));
    }

    #[test]
    fn test_module_loaded_from_plugin() {
        let harness = Harness::new();
        let mut loader = MockPluginLoader::new();
        loader
            .expect_try_load_from_plugin()
            .with(eq("reports"))
            .times(1)
            .return_const(true);
        let chain = harness.executor(loader, harness.shutdown_fallback());

        let disposition = chain
            .handle(AppError::ModuleNotFound { name: Some("reports".to_string()) })
            .unwrap();

        assert_handled_by(&disposition, "module_not_found");
        assert_eq!(harness.shutdown.calls(), 0);
        assert!(logged_messages(&harness.log).is_empty());
    }

    #[test]
    fn test_failed_plugin_load_falls_through() {
        let harness = Harness::new();
        let mut loader = MockPluginLoader::new();
        loader.expect_try_load_from_plugin().times(1).return_const(false);
        let chain = harness.executor(loader, harness.shutdown_fallback());

        let disposition = chain
            .handle(AppError::ModuleNotFound { name: Some("missing".to_string()) })
            .unwrap();

        assert_handled_by(&disposition, "unexpected");
        assert_eq!(harness.shutdown.calls(), 1);
    }

    #[test]
    fn test_interrupt_stops_before_later_handlers() {
        let harness = Harness::new();
        let chain = harness.executor(idle_loader(), harness.shutdown_fallback());

        let disposition = chain.handle(AppError::KeyboardInterrupt).unwrap();

        assert_handled_by(&disposition, "keyboard_interrupt");
        assert_eq!(harness.shutdown.calls(), 1);
        assert!(logged_messages(&harness.log).is_empty());
    }

    #[test]
    fn test_not_implemented_logged_once() {
        let harness = Harness::new();
        let chain = harness.executor(idle_loader(), harness.shutdown_fallback());

        let disposition = chain
            .handle(AppError::NotImplemented("export".to_string()))
            .unwrap();

        assert_handled_by(&disposition, "not_implemented");
        assert_eq!(
            logged_messages(&harness.log),
            vec!["NotImplemented error: export is not implemented"]
        );
    }

    #[test]
    fn test_exhausted_chain_runs_shutdown_fallback_once() {
        let harness = Harness::new();
        let chain = ChainExecutor::new(harness.shutdown_fallback())
            .with_handler(KeyboardInterruptHandler {
                shutdown: harness.shutdown.clone(),
            })
            .with_handler(NotImplementedHandler {
                shutdown: harness.shutdown.clone(),
                log: harness.log.clone(),
            });

        let disposition = chain.handle(AppError::Other("disk on fire".to_string())).unwrap();

        assert_fell_back(&disposition);
        assert_eq!(harness.shutdown.calls(), 1);
    }

    #[test]
    fn test_exhaustion_invokes_policy_exactly_once() {
        let mut policy = MockPolicy::new();
        policy.expect_on_unhandled().times(1).returning(|_| Ok(()));
        let harness = Harness::new();
        let chain = ChainExecutor::new(policy).with_handler(KeyboardInterruptHandler {
            shutdown: harness.shutdown.clone(),
        });

        assert_eq!(
            chain.handle(AppError::Other("x".to_string())).unwrap(),
            Disposition::FellBack
        );
    }

    #[test]
    fn test_linked_handlers_select_in_the_same_order() {
        let harness = Harness::new();
        let linked = HandlerLink::with_next(
            ModuleNotFoundHandler {
                loader: Arc::new(idle_loader()),
                log: harness.log.clone(),
            },
            HandlerLink::with_next(
                KeyboardInterruptHandler {
                    shutdown: harness.shutdown.clone(),
                },
                UnexpectedHandler {
                    shutdown: harness.shutdown.clone(),
                    log: harness.log.clone(),
                },
            ),
        );
        let mut ctx = HandlingContext::new(AppError::ModuleNotFound { name: None });

        linked.handle(&mut ctx).unwrap();

        assert_eq!(ctx.handled_by(), Some("unexpected"));
        assert_eq!(harness.shutdown.calls(), 1);
    }
}
