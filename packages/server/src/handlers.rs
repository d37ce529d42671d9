//! HTTP handler functions for popbuilder.

use actix_web::cookie::Cookie;
use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::UrlencodedError;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, web};
use popbuilder_database::{detail, summary};
use popbuilder_population_models::parse_zone_codes;
use popbuilder_server_models::{IntroForm, ResultsView, ZonesForm};
use popbuilder_visit::{CookieOp, Outcome, Page, VisitCookie, VisitInput, decide};

use crate::AppState;
use crate::templates::{self, DEFAULT_ERROR_MESSAGE};

/// Path every redirect points at.
pub const BASE_PATH: &str = "/";

/// File name offered for the CSV download.
pub const DOWNLOAD_FILE_NAME: &str = "download.csv";

type FormResult<T> = Result<web::Form<T>, actix_web::Error>;

/// `GET /` and `POST /`
///
/// Serves the intro or map page, or handles the intro form, as decided by
/// the visit-state gate.
pub async fn home(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: FormResult<IntroForm>,
) -> HttpResponse {
    let form = match read_form(form) {
        Ok(form) => form,
        Err(e) => {
            log::error!("Failed to read intro form: {e}");
            return error_page(&state);
        }
    };

    let decision = decide(&VisitInput {
        has_skip_cookie: req.cookie(VisitCookie::Skip.name()).is_some(),
        has_seen_cookie: req.cookie(VisitCookie::Seen.name()).is_some(),
        posted: &form.posted,
        skip_intro: &form.skip_intro,
    });

    let mut response = match decision.outcome {
        Outcome::Redirect => redirect_builder(),
        Outcome::Serve(_) => {
            let mut builder = HttpResponse::Ok();
            builder.content_type(ContentType::html());
            builder
        }
    };

    for op in decision.cookies {
        response.cookie(visit_cookie(op));
    }

    match decision.outcome {
        Outcome::Redirect => response.finish(),
        Outcome::Serve(Page::Intro) => response.body(state.pages.intro.clone()),
        Outcome::Serve(Page::Main) => response.body(state.pages.main.clone()),
    }
}

/// Converts a gate cookie operation into a response cookie.
fn visit_cookie(op: CookieOp) -> Cookie<'static> {
    match op {
        CookieOp::Set {
            cookie,
            max_age_secs,
        } => {
            let mut c = Cookie::new(cookie.name(), "1");
            c.set_path(BASE_PATH);
            c.set_expires(OffsetDateTime::now_utc() + Duration::seconds(max_age_secs));
            c
        }
        CookieOp::Expire(cookie) => {
            let mut c = Cookie::new(cookie.name(), "");
            c.set_path(BASE_PATH);
            c.make_removal();
            c
        }
    }
}

/// `POST /results`
///
/// Sums the population of the submitted zones and renders the results
/// page. An empty selection redirects home without touching the store.
pub async fn results(
    state: web::Data<AppState>,
    form: FormResult<ZonesForm>,
) -> HttpResponse {
    let form = match read_form(form) {
        Ok(form) => form,
        Err(e) => {
            log::error!("Failed to read zones form: {e}");
            return error_page(&state);
        }
    };

    let Some(zones) = submitted_zones(form) else {
        return redirect_home();
    };

    let codes = parse_zone_codes(&zones);

    let summary = match summary::get_summary(state.stores.summary.as_ref(), &codes).await {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Failed to query population summary: {e}");
            return error_page(&state);
        }
    };

    let view = ResultsView::new(summary, zones);

    match templates::render_results(&state.pages.results, &view) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            log::error!("Failed to render results page: {e}");
            error_page(&state)
        }
    }
}

/// `POST /download`
///
/// Sends the 5-year band population of each submitted zone as a CSV
/// attachment. An empty selection redirects home without touching the
/// store.
pub async fn download(
    state: web::Data<AppState>,
    form: FormResult<ZonesForm>,
) -> HttpResponse {
    let form = match read_form(form) {
        Ok(form) => form,
        Err(e) => {
            log::error!("Failed to read zones form: {e}");
            return error_page(&state);
        }
    };

    let Some(zones) = submitted_zones(form) else {
        return redirect_home();
    };

    let codes = parse_zone_codes(&zones);

    let rows = match detail::get_detail(state.stores.detail.as_ref(), &codes).await {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to query population detail: {e}");
            return error_page(&state);
        }
    };

    match templates::render_download(&rows) {
        Ok(body) => HttpResponse::Ok()
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={DOWNLOAD_FILE_NAME}"),
            ))
            .insert_header((header::CONTENT_TYPE, "text/csv; charset=utf-8"))
            // Older versions of IE need these for the download to succeed.
            .insert_header((
                header::CACHE_CONTROL,
                "must-revalidate, post-check=0, pre-check=0",
            ))
            .insert_header((header::PRAGMA, "public"))
            .body(body),
        Err(e) => {
            log::error!("Failed to render download: {e}");
            error_page(&state)
        }
    }
}

/// Fallback for any path without a handler.
pub async fn not_found(state: web::Data<AppState>) -> HttpResponse {
    not_found_page(&state)
}

/// Fallback for `/resources/*` requests that match no file.
///
/// # Errors
///
/// Never fails; the signature matches what `actix-files` expects of a
/// default handler.
pub async fn not_found_service(req: ServiceRequest) -> Result<ServiceResponse, actix_web::Error> {
    let (req, _payload) = req.into_parts();
    let response = req.app_data::<web::Data<AppState>>().map_or_else(
        || HttpResponse::NotFound().finish(),
        |state| not_found_page(state),
    );
    Ok(ServiceResponse::new(req, response))
}

fn not_found_page(state: &AppState) -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::html())
        .body(state.pages.not_found.clone())
}

/// The generic error page. Only the fixed message is shown.
fn error_page(state: &AppState) -> HttpResponse {
    let body = templates::render_error(&state.pages.error, DEFAULT_ERROR_MESSAGE)
        .unwrap_or_else(|e| {
            log::error!("Failed to render error page: {e}");
            DEFAULT_ERROR_MESSAGE.to_string()
        });

    HttpResponse::InternalServerError()
        .content_type(ContentType::html())
        .body(body)
}

/// Unwraps an extracted form. A request that carries no form body at all
/// reads as an empty form; every other extraction failure (oversized or
/// undecodable body) is returned.
fn read_form<T: Default>(form: FormResult<T>) -> Result<T, actix_web::Error> {
    match form {
        Ok(form) => Ok(form.into_inner()),
        Err(e) if is_missing_body(&e) => Ok(T::default()),
        Err(e) => Err(e),
    }
}

fn is_missing_body(e: &actix_web::Error) -> bool {
    matches!(
        e.as_error::<UrlencodedError>(),
        Some(UrlencodedError::ContentType)
    )
}

/// The zone selection from a form, or `None` if it is empty.
fn submitted_zones(form: ZonesForm) -> Option<String> {
    Some(form.zones).filter(|zones| !zones.is_empty())
}

fn redirect_builder() -> HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, BASE_PATH));
    builder
}

fn redirect_home() -> HttpResponse {
    redirect_builder().finish()
}
