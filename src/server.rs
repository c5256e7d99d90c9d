use std::sync::Arc;
use std::{fs, io};

use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use serde::Deserialize;
use spdlog::{error, info};

use crate::config::Config;
use crate::content::RenderMode;
use crate::error::BlogError;
use crate::post_repo::{render_post_list, ListFilter, PostRepo};
use crate::query_string::QueryString;
use crate::view::home_page::HomePageRenderer;
use crate::view::post_page::PostPageRenderer;

const HOME_TEMPLATE: &str = "home.tpl";
const NOT_FOUND_TEMPLATE: &str = "404.tpl";

struct AppState {
    config: Config,
    repo: PostRepo,
}

#[derive(Deserialize)]
struct SearchForm {
    search: String,
}

fn read_template(state: &AppState, file_name: &str) -> io::Result<String> {
    let full_path = state.config.paths.template_dir.join(file_name);
    fs::read_to_string(full_path)
}

fn html_response(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn server_error(context: &str, e: &BlogError) -> web::HttpResponse {
    error!("Error {}: {}", context, e);
    web::HttpResponse::InternalServerError().body(format!("Error {}", context))
}

fn not_found_response(state: &AppState, name: &str) -> web::HttpResponse {
    info!("Post not found: {}", name);
    let body = read_template(state, NOT_FOUND_TEMPLATE)
        .and_then(|src| PostPageRenderer::new(&src).map(|r| r.render_fragment(&state.config.site.title, "")))
        .unwrap_or_else(|_| "Page not found".to_string());

    web::HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn page_param(req: &HttpRequest) -> Result<u32, BlogError> {
    match req.uri().query() {
        Some(query_str) => QueryString::from(query_str).page(),
        None => Ok(1),
    }
}

fn render_filtered_list(state: &AppState, filter: &ListFilter) -> Result<String, BlogError> {
    let entries = state.repo.list_posts(filter)?;
    let fragment = render_post_list(&entries);

    let tpl_src = read_template(state, &state.config.defaults.default_layout)?;
    let renderer = PostPageRenderer::new(&tpl_src)?;
    Ok(renderer.render_fragment(&state.config.site.title, &fragment))
}

fn filtered_list_response(state: &AppState, context: &str, filter: &ListFilter) -> web::HttpResponse {
    match render_filtered_list(state, filter) {
        Ok(body) => html_response(body),
        Err(e) => server_error(context, &e),
    }
}

#[web::get("/")]
async fn index(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let page = match page_param(&req) {
        Ok(page) => page,
        Err(e) => return web::HttpResponse::BadRequest().body(e.to_string()),
    };

    let rendered = (|| -> Result<String, BlogError> {
        let recent = state.repo.recent_posts(page)?;
        let aggregate = state.repo.build_abstracts(&recent, page)?;
        let tpl_src = read_template(&state, HOME_TEMPLATE)?;
        let renderer = HomePageRenderer::new(&tpl_src)?;
        Ok(renderer.render(&state.config.site.title, &aggregate))
    })();

    match rendered {
        Ok(body) => html_response(body),
        Err(e) => server_error("rendering index", &e),
    }
}

#[web::get("/tag/{tag}")]
async fn tag_page(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let filter = ListFilter {
        tags: vec![path.into_inner()],
        ..Default::default()
    };
    filtered_list_response(&state, "listing posts by tag", &filter)
}

#[web::get("/category/{category}")]
async fn category_page(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let filter = ListFilter {
        category: path.into_inner(),
        ..Default::default()
    };
    filtered_list_response(&state, "listing posts by category", &filter)
}

#[web::get("/author/{author}")]
async fn author_page(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let filter = ListFilter {
        author: path.into_inner(),
        ..Default::default()
    };
    filtered_list_response(&state, "listing posts by author", &filter)
}

#[web::post("/search")]
async fn search_page(form: web::types::Form<SearchForm>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let filter = ListFilter {
        search: form.search.clone(),
        ..Default::default()
    };
    filtered_list_response(&state, "searching posts", &filter)
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> Result<NamedFile, web::Error> {
    if path.contains("../") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

#[web::get("/{post}")]
async fn view_post(path: web::types::Path<String>, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let name = path.into_inner();

    let entry = match state.repo.render_post(&name, RenderMode::FullContent) {
        Ok(entry) => entry,
        Err(e) if e.is_not_found() => return not_found_response(&state, &name),
        Err(e) => return server_error("rendering post", &e),
    };

    let layout = entry
        .template
        .clone()
        .unwrap_or_else(|| state.config.defaults.default_layout.clone());

    let rendered = (|| -> Result<String, BlogError> {
        let tpl_src = read_template(&state, &layout)?;
        let renderer = PostPageRenderer::new(&tpl_src)?;
        Ok(renderer.render(&state.config.site.title, &entry))
    })();

    match rendered {
        Ok(body) => html_response(body),
        Err(e) => server_error("rendering post", &e),
    }
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;

    let repo = PostRepo::new(config.paths.posts_dir.clone(), config.defaults.page_size);
    let app_state = Arc::new(AppState { config, repo });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(tag_page)
            .service(category_page)
            .service(author_page)
            .service(search_page)
            .service(public_files)
            .service(view_post)
    })
    .bind((bind_addr, bind_port))?
    .run()
    .await
}
