// src/web/mod.rs

//! HTTP surface: a liveness route, the cron trigger and one page per source.

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware, web};

use crate::error::Result;
use crate::models::ComicSource;
use crate::pipeline::run_cron;
use crate::services::{Notifier, ProviderRegistry, TemplateService};
use crate::storage::RecordStore;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Shared state handed to every handler.
pub struct AppState {
    pub registry: ProviderRegistry,
    pub store: Arc<dyn RecordStore>,
    pub notifier: Arc<Notifier>,
    pub templates: Arc<TemplateService>,
    pub fetch_limit: usize,
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().content_type(TEXT_PLAIN).body("Hello world!")
}

#[get("/cron")]
async fn cron(state: web::Data<AppState>) -> impl Responder {
    let result = run_cron(
        &state.registry,
        Arc::clone(&state.store),
        &state.notifier,
        state.fetch_limit,
    )
    .await;

    match result {
        Ok(report) if report.has_write_failures() => HttpResponse::InternalServerError()
            .content_type(TEXT_PLAIN)
            .body(report.render()),
        Ok(report) => HttpResponse::Ok().content_type(TEXT_PLAIN).body(report.render()),
        Err(e) => {
            log::error!("Cron failed: {}", e);
            HttpResponse::InternalServerError()
                .content_type(TEXT_PLAIN)
                .body(format!("Cron failed: {e}"))
        }
    }
}

#[get("/{source}")]
async fn comic_page(path: web::Path<String>, state: web::Data<AppState>) -> impl Responder {
    let name = path.into_inner();
    let provider = name
        .parse::<ComicSource>()
        .ok()
        .and_then(|source| state.registry.get(source));
    let Some(provider) = provider else {
        return HttpResponse::NotFound()
            .content_type(TEXT_PLAIN)
            .body(format!("Unknown comic: {name}"));
    };

    let source = provider.source();
    let rendered = match provider.latest().await {
        Ok(latest) => state.templates.render_comic(source, latest.as_ref()),
        Err(e) => Err(e),
    };

    match rendered {
        Ok(html) => HttpResponse::Ok().content_type(TEXT_HTML).body(html),
        Err(e) => {
            log::error!("Failed to build {} page: {}", source, e);
            HttpResponse::InternalServerError()
                .content_type(TEXT_PLAIN)
                .body(format!("Failed to build {source} page: {e}"))
        }
    }
}

/// Register every route. `/{source}` goes last so it does not shadow `/cron`.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(cron).service(comic_page);
}

/// Run the HTTP server until it is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let state = web::Data::new(state);
    log::info!("Listening on http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::Identifier;
    use crate::services::LatestProvider;
    use crate::services::testing::{RecordingMailer, notifier_with};
    use crate::storage::MemoryStorage;

    struct FixedProvider(ComicSource, Option<Identifier>);

    #[async_trait]
    impl LatestProvider for FixedProvider {
        fn source(&self) -> ComicSource {
            self.0
        }

        async fn latest(&self) -> crate::error::Result<Option<Identifier>> {
            Ok(self.1.clone())
        }
    }

    struct DownProvider(ComicSource);

    #[async_trait]
    impl LatestProvider for DownProvider {
        fn source(&self) -> ComicSource {
            self.0
        }

        async fn latest(&self) -> crate::error::Result<Option<Identifier>> {
            Err(AppError::validation("site is down"))
        }
    }

    fn state_with(providers: Vec<Arc<dyn LatestProvider>>) -> web::Data<AppState> {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }
        web::Data::new(AppState {
            registry,
            store: Arc::new(MemoryStorage::new()),
            notifier: Arc::new(notifier_with(Arc::new(RecordingMailer::default()))),
            templates: Arc::new(TemplateService::builtin().unwrap()),
            fetch_limit: 100,
        })
    }

    #[actix_web::test]
    async fn test_index() {
        let app =
            test::init_service(App::new().app_data(state_with(vec![])).configure(routes)).await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "Hello world!");
    }

    #[actix_web::test]
    async fn test_unknown_and_disabled_sources_are_404() {
        let state = state_with(vec![Arc::new(FixedProvider(ComicSource::Jl8, None))]);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/garfield").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get().uri("/xkcd").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_comic_page_renders_latest() {
        let state = state_with(vec![Arc::new(FixedProvider(
            ComicSource::Xkcd,
            Some(Identifier::Pair("http://img/1.png".into(), "Title A".into())),
        ))]);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/xkcd").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("Title A"));
        assert!(html.contains("1.png"));
    }

    #[actix_web::test]
    async fn test_comic_page_without_strip_still_renders() {
        let state = state_with(vec![Arc::new(FixedProvider(ComicSource::Smbc, None))]);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/smbc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("No comic found"));
    }

    #[actix_web::test]
    async fn test_comic_page_fetch_failure_is_500() {
        let state = state_with(vec![Arc::new(DownProvider(ComicSource::Jl8))]);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/jl8").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_cron_returns_trace() {
        let state = state_with(vec![Arc::new(FixedProvider(
            ComicSource::Jl8,
            Some(Identifier::Number(42)),
        ))]);
        let app = test::init_service(App::new().app_data(state.clone()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/cron").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("jl8: latest=42 last_seen=null"));
        assert!(text.ends_with("Done."));
        assert_eq!(state.store.load_records("comic", 100).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_cron_failure_is_500() {
        let state = state_with(vec![Arc::new(DownProvider(ComicSource::Xkcd))]);
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        let req = test::TestRequest::get().uri("/cron").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
