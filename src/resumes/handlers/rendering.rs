// src/resumes/handlers/rendering.rs
//
// HTML previews and PDF downloads

use crate::auth::AuthedUser;
use crate::common::helpers::html_to_text;
use crate::common::{ApiError, AppState};
use crate::resumes::handlers::fetch_resume;
use crate::resumes::models::Resume;
use crate::services::pdf::{latex_to_html, PdfService};
use crate::services::resume_content::{build_resume_html_template, convert_text_to_html, wrap_html_page};
use axum::{
    extract::{Extension, Path},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Structured template for target resumes, plain conversion otherwise
async fn preview_document(state: &AppState, resume: &Resume) -> String {
    match resume.target_description() {
        Some(jd) => {
            let data = state
                .resume_content
                .generate_resume_content(jd, resume.current_text())
                .await;
            build_resume_html_template(Some(&data))
        }
        None if resume.is_tailored => {
            let data = state
                .resume_content
                .generate_resume_content("", resume.current_text())
                .await;
            build_resume_html_template(Some(&data))
        }
        None => wrap_html_page(&resume.title, &convert_text_to_html(&resume.original_text)),
    }
}

/// Text for the built-in PDF writer
fn download_text(resume: &Resume) -> String {
    match resume.latex_source.as_deref().filter(|l| !l.trim().is_empty()) {
        Some(latex) => html_to_text(&latex_to_html(latex)),
        None => resume.original_text.clone(),
    }
}

async fn render_pdf(state: &AppState, resume: &Resume) -> Option<Vec<u8>> {
    if let Some(latex) = resume.latex_source.as_deref().filter(|l| !l.trim().is_empty()) {
        if state.pdf_service.has_compiler() {
            match state.pdf_service.compile_latex(latex).await {
                Ok(bytes) => return Some(bytes),
                Err(e) => warn!(error = %e, resume_id = %resume.id, "LaTeX compilation failed"),
            }
        }
    }

    let title = resume.title.clone();
    let text = download_text(resume);
    match tokio::task::spawn_blocking(move || PdfService::render_text_pdf(&title, &text)).await {
        Ok(Ok(bytes)) => Some(bytes),
        Ok(Err(e)) => {
            warn!(error = %e, resume_id = %resume.id, "PDF rendering failed");
            None
        }
        Err(e) => {
            warn!(error = %e, resume_id = %resume.id, "PDF rendering task panicked");
            None
        }
    }
}

fn attachment(content_type: &'static str, filename: String, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/resumes/:id/preview
pub async fn preview_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    Ok(Html(preview_document(&state, &resume).await))
}

/// GET /api/resumes/:id/preview-html
pub async fn preview_resume_html(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    let job_description = resume.target_description().unwrap_or("");
    let text = resume.current_text();

    let page = if text.trim().is_empty() && job_description.is_empty() {
        build_resume_html_template(None)
    } else {
        let data = state
            .resume_content
            .generate_resume_content(job_description, text)
            .await;
        build_resume_html_template(Some(&data))
    };

    Ok(Html(page))
}

/// GET /api/resumes/:id/preview-pdf
pub async fn preview_resume_pdf(
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Response, ApiError> {
    info!(user_id = %authed.id, resume_id = %resume_id, "Rejected deprecated PDF preview");
    Err(ApiError::Gone(
        "PDF preview is disabled. Use /preview-html instead.".to_string(),
    ))
}

/// GET /api/resumes/:id/download - PDF, or HTML when no PDF can be produced
pub async fn download_resume(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(resume_id): Path<String>,
) -> Result<Response, ApiError> {
    let state = state_lock.read().await.clone();
    let resume = fetch_resume(&state.db, &resume_id, &authed.id).await?;

    let pdf = render_pdf(&state, &resume).await;
    Ok(download_document(&state, &resume, pdf).await)
}

/// PDF attachment when one was rendered, the HTML preview otherwise
pub async fn download_document(state: &AppState, resume: &Resume, pdf: Option<Vec<u8>>) -> Response {
    let stem = resume.download_stem();
    if let Some(pdf) = pdf {
        info!(user_id = %resume.user_id, resume_id = %resume.id, bytes = pdf.len(), "Resume downloaded as PDF");
        return attachment("application/pdf", format!("{}.pdf", stem), pdf);
    }

    let html = preview_document(state, resume).await;
    info!(user_id = %resume.user_id, resume_id = %resume.id, "Resume downloaded as HTML");
    attachment(
        "text/html; charset=utf-8",
        format!("{}.html", stem),
        html.into_bytes(),
    )
}
