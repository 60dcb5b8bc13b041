//! # Restoration Fallbacks
//!
//! Every restoration miss ends in normal initialization, never in an error:
//! a missing state element, a node absent from the blob, a root that reports
//! failure. Only a root that never answers surfaces as a `TimeoutError`, and
//! a blob that cannot be decoded surfaces as a dispatched error.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use cs_01_render_strategies::{InMemoryRenderer, LifecycleError, ParameterView, RendererInfo};
    use cs_02_component_state::{
        InMemoryDocument, NodeId, RestoreStatus, StateLink, DEFAULT_ROOT_RESTORE_TIMEOUT,
        STATE_PARENT_CASCADE, STATE_ROOT_CASCADE,
    };
    use tokio::time::Instant;

    use crate::integration::fixtures::{
        decode_default_state, factory, persistent, prerender_counter_page, render, Counter,
        CounterPage, Panel,
    };

    // =============================================================================
    // MISSING STATE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_missing_blob_initializes_every_component_once() {
        state_telemetry::init_test_logging();
        let factory = factory(InMemoryDocument::new());
        let top = Counter::new(1);
        let nested = Counter::new(2);
        let panel = Panel::new("panel", vec![persistent(&factory, &nested).as_component()]);
        let page = CounterPage::new(
            3,
            vec![
                persistent(&factory, &top).as_component(),
                persistent(&factory, &panel).as_component(),
            ],
        );
        let page_strategy = persistent(&factory, &page);

        let started = Instant::now();
        let renderer = render(RendererInfo::WEB_ASSEMBLY, &page_strategy).await;

        assert!(started.elapsed() < DEFAULT_ROOT_RESTORE_TIMEOUT);
        assert!(renderer.take_errors().is_empty());
        assert_eq!(
            (page.init_calls(), top.init_calls(), nested.init_calls()),
            (1, 1, 1)
        );
        assert_eq!(top.restored_calls() + nested.restored_calls(), 0);
        assert_eq!(
            page_strategy.scope().unwrap().restore_status(),
            RestoreStatus::Failed
        );
        assert_eq!((page.count(), top.value(), nested.value()), (3, 1, 2));
    }

    #[tokio::test]
    async fn test_component_missing_from_blob_initializes_locally() {
        let markup = prerender_counter_page(3, 7).await;

        let factory = factory(InMemoryDocument::from_markup(&markup));
        let known = Counter::new(0);
        let added = Counter::with_id("added", 11);
        let page = CounterPage::new(
            0,
            vec![
                persistent(&factory, &known).as_component(),
                persistent(&factory, &added).as_component(),
            ],
        );
        let renderer = render(RendererInfo::WEB_ASSEMBLY, &persistent(&factory, &page)).await;

        assert!(renderer.take_errors().is_empty());
        assert_eq!((known.value(), known.init_calls()), (7, 0));
        assert_eq!((added.value(), added.init_calls()), (11, 1));
        assert_eq!(added.restored_calls(), 0);
    }

    #[tokio::test]
    async fn test_prerender_ignores_existing_blob() {
        let stale = STANDARD.encode(r#"{"count":99,"n__Counter":{"value":99}}"#);
        let factory = factory(InMemoryDocument::new().with_element("page-state", stale));
        let counter = Counter::new(4);
        let page = CounterPage::new(2, vec![persistent(&factory, &counter).as_component()]);

        let renderer = render(RendererInfo::STATIC, &persistent(&factory, &page)).await;

        assert_eq!((page.count(), counter.value()), (2, 4));
        assert_eq!(
            decode_default_state(&renderer.to_markup()).await.as_deref(),
            Some(r#"{"count":2,"n__Counter":{"value":4}}"#)
        );
    }

    // =============================================================================
    // FAILURES
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_root_that_never_restores_times_out() {
        let factory = factory(InMemoryDocument::new());
        let page_strategy = persistent(&factory, &CounterPage::new(0, Vec::new()));
        let scope = page_strategy.scope().unwrap();

        let counter = Counter::new(5);
        let counter_strategy = persistent(&factory, &counter);
        let parameters = ParameterView::new()
            .with_cascade(STATE_ROOT_CASCADE, scope.as_cascade())
            .with_cascade(
                STATE_PARENT_CASCADE,
                Arc::new(StateLink::new(Arc::clone(&scope), NodeId::ROOT)),
            );

        let started = Instant::now();
        let renderer = InMemoryRenderer::new(RendererInfo::WEB_ASSEMBLY);
        renderer
            .render_root(counter_strategy.as_component(), parameters)
            .await
            .unwrap();

        let errors = renderer.take_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            LifecycleError::Timeout(t) if t.timeout == Duration::from_millis(5000)
        ));
        assert!(started.elapsed() >= DEFAULT_ROOT_RESTORE_TIMEOUT);
        assert_eq!(counter.init_calls(), 0);
        assert!(!counter_strategy.strategy().has_rendered());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_dispatched() {
        let factory = factory(InMemoryDocument::new().with_element("page-state", "!!not-base64!!"));
        let counter = Counter::new(1);
        let page = CounterPage::new(1, vec![persistent(&factory, &counter).as_component()]);
        let page_strategy = persistent(&factory, &page);

        let renderer = render(RendererInfo::WEB_ASSEMBLY, &page_strategy).await;
        let errors = renderer.take_errors();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("Failed to decode page state"));
        assert_eq!(
            page_strategy.scope().unwrap().restore_status(),
            RestoreStatus::Failed
        );
        assert!(!page_strategy.strategy().has_rendered());
        assert_eq!(counter.init_calls(), 0);
    }
}
