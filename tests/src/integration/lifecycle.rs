//! # Lifecycle Around Persistence
//!
//! Restored components keep behaving like ordinary components afterwards,
//! and plain strategies gated by prerequisites share the tree with
//! persistent ones without holding up the page state.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use cs_01_render_strategies::{
        Component, ComponentRenderStrategy, LifecycleError, Prerequisite, PrerequisiteCallback,
        PrerequisiteCollection, RenderTreeBuilder, RendererInfo, StrategyRenderedComponent,
    };
    use cs_02_component_state::InMemoryDocument;
    use tokio::time::{sleep, Instant};

    use crate::integration::fixtures::{
        decode_default_state, factory, persistent, prerender_counter_page, render, Counter,
        CounterPage,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Non-persistent component that renders only once `ready` holds.
    struct Banner {
        prerequisites: PrerequisiteCollection,
    }

    impl Banner {
        fn gated(ready: &Arc<AtomicBool>, callback: &PrerequisiteCallback, timeout: Duration) -> Arc<Self> {
            let ready = Arc::clone(ready);
            let prerequisites = PrerequisiteCollection::new();
            prerequisites
                .add(
                    Prerequisite::manual(move || ready.load(Ordering::SeqCst))
                        .with_callback(callback)
                        .with_timeout(timeout)
                        .build(),
                )
                .unwrap();
            Arc::new(Self { prerequisites })
        }
    }

    impl StrategyRenderedComponent for Banner {
        fn prerequisites(&self) -> Option<&PrerequisiteCollection> {
            Some(&self.prerequisites)
        }

        fn build_render_tree(&self, builder: &mut RenderTreeBuilder) {
            builder.add_markup("<aside>welcome</aside>");
        }
    }

    fn plain(component: Arc<Banner>) -> Arc<dyn Component> {
        ComponentRenderStrategy::new(component)
    }

    // =============================================================================
    // AFTER RESTORE
    // =============================================================================

    #[tokio::test]
    async fn test_event_on_restored_component_rerenders() {
        let markup = prerender_counter_page(3, 7).await;

        let factory = factory(InMemoryDocument::from_markup(&markup));
        let counter = Counter::new(0);
        let counter_strategy = persistent(&factory, &counter);
        let page = CounterPage::new(0, vec![counter_strategy.as_component()]);
        let renderer = render(RendererInfo::WEB_ASSEMBLY, &persistent(&factory, &page)).await;
        assert!(renderer.to_markup().contains(r#"<span class="counter">7</span>"#));

        let clicked = Arc::clone(&counter);
        counter_strategy
            .strategy()
            .handle_event(async move {
                clicked.increment();
                Ok(())
            })
            .await
            .unwrap();
        renderer.run_until_quiescent().await;

        assert!(renderer.to_markup().contains(r#"<span class="counter">8</span>"#));
        assert!(renderer.take_errors().is_empty());
        assert_eq!(counter.init_calls(), 0);
        assert_eq!(counter.restored_calls(), 1);
    }

    // =============================================================================
    // PREREQUISITES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_gated_sibling_renders_after_callback() {
        let ready = Arc::new(AtomicBool::new(false));
        let callback = PrerequisiteCallback::new();
        let banner = Banner::gated(&ready, &callback, Duration::from_secs(5));

        let signal = callback.clone();
        let flag = Arc::clone(&ready);
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            signal.invoke();
        });

        let factory = factory(InMemoryDocument::new());
        let counter = Counter::new(2);
        let page = CounterPage::new(
            1,
            vec![persistent(&factory, &counter).as_component(), plain(banner)],
        );

        let started = Instant::now();
        let renderer = render(RendererInfo::STATIC, &persistent(&factory, &page)).await;
        let elapsed = started.elapsed();

        assert!(renderer.take_errors().is_empty());
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(5));
        let markup = renderer.to_markup();
        assert!(markup.contains("<aside>welcome</aside>"));
        assert_eq!(
            decode_default_state(&markup).await.as_deref(),
            Some(r#"{"count":1,"n__Counter":{"value":2}}"#)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_prerequisite_timeout_does_not_block_page_state() {
        let ready = Arc::new(AtomicBool::new(false));
        let banner = Banner::gated(&ready, &PrerequisiteCallback::new(), Duration::from_millis(200));

        let factory = factory(InMemoryDocument::new());
        let counter = Counter::new(6);
        let page = CounterPage::new(
            4,
            vec![persistent(&factory, &counter).as_component(), plain(banner)],
        );
        let renderer = render(RendererInfo::STATIC, &persistent(&factory, &page)).await;

        let errors = renderer.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            LifecycleError::Timeout(t) if t.timeout == Duration::from_millis(200)
        ));

        let markup = renderer.to_markup();
        assert!(!markup.contains("<aside>"));
        assert_eq!(
            decode_default_state(&markup).await.as_deref(),
            Some(r#"{"count":4,"n__Counter":{"value":6}}"#)
        );
    }
}
