//! # Prerender → Interactive Round Trips
//!
//! The prerender pass emits the page state blob; the interactive pass reads
//! it back through the document and restores every component in place of
//! normal initialization.
//!
//! ```text
//! STATIC pass                 markup                  WEB_ASSEMBLY pass
//! initialize_state ──→ <script id="page-state"> ──→ restore + on_state_restored
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cs_01_render_strategies::{LifecycleError, RendererInfo, StrategyRenderedComponent};
    use cs_02_component_state::{
        ComponentStateRegistry, InMemoryDocument, PersistenceConfig, PersistenceServices,
        PersistentComponent, RenderStrategyFactory, RestoreStatus,
    };
    use serde_json::{json, Value};

    use crate::integration::fixtures::{
        decode_default_state, decode_state, factory, factory_with, persistent,
        prerender_counter_page, render, Counter, CounterPage, Panel,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// A page with nothing to persist.
    struct PlainPage;

    impl StrategyRenderedComponent for PlainPage {
        fn build_render_tree(&self, builder: &mut cs_01_render_strategies::RenderTreeBuilder) {
            builder.add_markup("<p>static</p>");
        }
    }

    impl PersistentComponent for PlainPage {}

    // =============================================================================
    // PRERENDER
    // =============================================================================

    #[tokio::test]
    async fn test_prerender_emits_page_state_blob() {
        let factory = factory(InMemoryDocument::new());
        let counter = Counter::new(7);
        let page = CounterPage::new(3, vec![persistent(&factory, &counter).as_component()]);
        let page_strategy = persistent(&factory, &page);

        let renderer = render(RendererInfo::STATIC, &page_strategy).await;
        let markup = renderer.to_markup();

        assert!(renderer.take_errors().is_empty());
        assert_eq!(
            decode_default_state(&markup).await.as_deref(),
            Some(r#"{"count":3,"n__Counter":{"value":7}}"#)
        );
        assert!(markup.starts_with(r#"<script id="page-state" type="text/template">"#));
        assert!(markup.contains("<h1>Count: 3</h1>"));
        assert!(markup.contains(r#"<span class="counter">7</span>"#));
        assert_eq!(page.init_calls(), 1);
        assert_eq!(counter.init_calls(), 1);
    }

    #[tokio::test]
    async fn test_page_without_state_emits_no_blob() {
        let registry = ComponentStateRegistry::builder()
            .register_page::<PlainPage>()
            .build();
        let services = PersistenceServices::new(registry, Arc::new(InMemoryDocument::new()));
        let factory = RenderStrategyFactory::new(Arc::new(services)).unwrap();
        let page = factory.create(Arc::new(PlainPage)).unwrap();

        let renderer = render(RendererInfo::STATIC, &page).await;

        assert_eq!(renderer.to_markup(), "<p>static</p>");
        assert!(renderer.take_errors().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_state_ids_reported() {
        let factory = factory(InMemoryDocument::new());
        let first = persistent(&factory, &Counter::with_id("twin", 1));
        let second = persistent(&factory, &Counter::with_id("twin", 2));
        let page = persistent(
            &factory,
            &CounterPage::new(3, vec![first.as_component(), second.as_component()]),
        );

        let renderer = render(RendererInfo::STATIC, &page).await;
        let errors = renderer.take_errors();

        assert!(!errors.is_empty());
        assert!(errors.iter().all(|e| matches!(e, LifecycleError::Extension(_))));
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("Duplicate state position 'twin'")));
    }

    // =============================================================================
    // INTERACTIVE RESTORE
    // =============================================================================

    #[tokio::test]
    async fn test_interactive_pass_restores_instead_of_initializing() {
        let markup = prerender_counter_page(3, 7).await;

        let factory = factory(InMemoryDocument::from_markup(&markup));
        let counter = Counter::new(0);
        let counter_strategy = persistent(&factory, &counter);
        let page = CounterPage::new(0, vec![counter_strategy.as_component()]);
        let page_strategy = persistent(&factory, &page);

        let renderer = render(RendererInfo::WEB_ASSEMBLY, &page_strategy).await;

        assert!(renderer.take_errors().is_empty());
        assert_eq!(page.count(), 3);
        assert_eq!(counter.value(), 7);
        assert_eq!(page.init_calls(), 0);
        assert_eq!(counter.init_calls(), 0);
        assert_eq!(page.restored_calls(), 1);
        assert_eq!(counter.restored_calls(), 1);
        assert!(counter_strategy.state().is_state_restored());
        assert_eq!(
            page_strategy.scope().unwrap().restore_status(),
            RestoreStatus::Restored
        );

        let interactive = renderer.to_markup();
        assert!(!interactive.contains("<script"));
        assert!(interactive.contains("<h1>Count: 3</h1>"));
        assert!(interactive.contains(r#"<span class="counter">7</span>"#));
    }

    #[tokio::test]
    async fn test_server_interactive_pass_also_restores() {
        let markup = prerender_counter_page(5, 9).await;

        let factory = factory(InMemoryDocument::from_markup(&markup));
        let counter = Counter::new(0);
        let page = CounterPage::new(0, vec![persistent(&factory, &counter).as_component()]);
        let renderer = render(RendererInfo::SERVER, &persistent(&factory, &page)).await;

        assert!(renderer.take_errors().is_empty());
        assert_eq!((page.count(), counter.value()), (5, 9));
    }

    #[tokio::test]
    async fn test_nested_panels_round_trip() {
        let prerender = factory(InMemoryDocument::new());
        let left = persistent(&prerender, &Counter::new(1));
        let right = persistent(&prerender, &Counter::new(2));
        let page = CounterPage::new(
            4,
            vec![
                persistent(&prerender, &Panel::new("left", vec![left.as_component()])).as_component(),
                persistent(&prerender, &Panel::new("right", vec![right.as_component()])).as_component(),
            ],
        );
        let markup = render(RendererInfo::STATIC, &persistent(&prerender, &page))
            .await
            .to_markup();

        let blob: Value = serde_json::from_str(&decode_default_state(&markup).await.unwrap()).unwrap();
        assert_eq!(
            blob,
            json!({
                "count": 4,
                "n__left": {"n__Counter": {"value": 1}},
                "n__right": {"n__Counter": {"value": 2}},
            })
        );

        let interactive = factory(InMemoryDocument::from_markup(&markup));
        let left = Counter::new(0);
        let right = Counter::new(0);
        let left_panel = Panel::new("left", vec![persistent(&interactive, &left).as_component()]);
        let right_panel = Panel::new("right", vec![persistent(&interactive, &right).as_component()]);
        let page = CounterPage::new(
            0,
            vec![
                persistent(&interactive, &left_panel).as_component(),
                persistent(&interactive, &right_panel).as_component(),
            ],
        );
        let renderer = render(RendererInfo::WEB_ASSEMBLY, &persistent(&interactive, &page)).await;

        assert!(renderer.take_errors().is_empty());
        assert_eq!((left.value(), right.value()), (1, 2));
        assert_eq!(left.init_calls() + right.init_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_state_element_id() {
        let config = PersistenceConfig::default().with_state_element_id("app-state");

        let prerender = factory_with(InMemoryDocument::new(), config.clone());
        let page = CounterPage::new(
            2,
            vec![persistent(&prerender, &Counter::new(8)).as_component()],
        );
        let markup = render(RendererInfo::STATIC, &persistent(&prerender, &page))
            .await
            .to_markup();
        assert!(markup.contains(r#"id="app-state""#));
        assert!(decode_state(&markup, "app-state").await.is_some());

        let interactive = factory_with(InMemoryDocument::from_markup(&markup), config);
        let counter = Counter::new(0);
        let page = CounterPage::new(0, vec![persistent(&interactive, &counter).as_component()]);
        render(RendererInfo::WEB_ASSEMBLY, &persistent(&interactive, &page)).await;

        assert_eq!((page.count(), counter.value()), (2, 8));
    }

    // =============================================================================
    // CHILDREN LEAVING THE TREE
    // =============================================================================

    #[tokio::test]
    async fn test_swapped_child_replaces_its_state_node() {
        let factory = factory(InMemoryDocument::new());
        let original = Counter::new(0);
        let page = CounterPage::new(3, vec![persistent(&factory, &original).as_component()]);
        let page_strategy = persistent(&factory, &page);

        let renderer = render(RendererInfo::STATIC, &page_strategy).await;
        assert_eq!(
            decode_default_state(&renderer.to_markup()).await.as_deref(),
            Some(r#"{"count":3,"n__Counter":{"value":0}}"#)
        );

        let replacement = persistent(&factory, &Counter::new(7)).as_component();
        let target = Arc::clone(&page);
        page_strategy
            .strategy()
            .handle_event(async move {
                target.set_children(vec![replacement]);
                Ok(())
            })
            .await
            .unwrap();
        renderer.run_until_quiescent().await;

        assert!(renderer.take_errors().is_empty());
        let markup = renderer.to_markup();
        assert!(markup.contains(r#"<span class="counter">7</span>"#));
        assert!(!markup.contains(r#"<span class="counter">0</span>"#));
        assert_eq!(
            decode_default_state(&markup).await.as_deref(),
            Some(r#"{"count":3,"n__Counter":{"value":7}}"#)
        );
        let scope = page_strategy.scope().unwrap();
        assert_eq!(scope.with_graph(|graph| graph.len()), 2);
    }

    #[tokio::test]
    async fn test_removed_child_leaves_the_blob() {
        let factory = factory(InMemoryDocument::new());
        let counter = persistent(&factory, &Counter::new(5));
        let page = CounterPage::new(1, vec![counter.as_component()]);
        let page_strategy = persistent(&factory, &page);
        let renderer = render(RendererInfo::STATIC, &page_strategy).await;

        let target = Arc::clone(&page);
        page_strategy
            .strategy()
            .handle_event(async move {
                target.set_children(Vec::new());
                Ok(())
            })
            .await
            .unwrap();
        renderer.run_until_quiescent().await;

        assert!(counter.strategy().is_disposed());
        assert_eq!(
            decode_default_state(&renderer.to_markup()).await.as_deref(),
            Some(r#"{"count":1}"#)
        );
    }
}
