//! Tests for resumes module

#[cfg(test)]
mod tests {
    use super::super::models::*;
    use super::super::*;
    use crate::common::{ApiError, Validator};
    use crate::services::test_support;
    use axum::extract::{Extension, Json, Path};
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use serde_json::json;

    const SAMPLE_RESUME: &str = "Jane Doe\njane@example.com | 555-123-4567\n\nEXPERIENCE\nSoftware Engineer at Acme 2019 - 2023\nBuilt Rust services and PostgreSQL pipelines.\n\nSKILLS\nRust, Python, Docker, Kubernetes";

    // ============================================================================
    // Models and validators
    // ============================================================================

    #[test]
    fn test_tailor_request_job_description_text() {
        let req = TailorRequest { job_description: Some(json!("Backend role")) };
        assert_eq!(req.job_description_text().as_deref(), Some("Backend role"));

        let blank = TailorRequest { job_description: Some(json!("   ")) };
        assert_eq!(blank.job_description_text(), None);

        let null = TailorRequest { job_description: Some(json!(null)) };
        assert_eq!(null.job_description_text(), None);

        let object = TailorRequest { job_description: Some(json!({"title": "SRE"})) };
        assert_eq!(object.job_description_text().as_deref(), Some(r#"{"title":"SRE"}"#));
    }

    #[test]
    fn test_update_validator() {
        let v = validators::UpdateResumeValidator;
        assert!(!v.validate(&UpdateResumeRequest::default()).is_valid);
        assert!(!v
            .validate(&UpdateResumeRequest { title: Some("  ".to_string()), original_text: None })
            .is_valid);
        assert!(!v
            .validate(&UpdateResumeRequest { title: Some("x".repeat(201)), original_text: None })
            .is_valid);
        assert!(v
            .validate(&UpdateResumeRequest { title: None, original_text: Some("text".to_string()) })
            .is_valid);
    }

    // ============================================================================
    // Upload and CRUD
    // ============================================================================

    #[tokio::test]
    async fn test_upload_stores_file_row_and_embedding() {
        let (state_lock, uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;

        let (resume, validation) = handlers::save_uploaded_resume(
            &state,
            &user.id,
            "Backend",
            "../My Resume.txt",
            format!("  {}  ", SAMPLE_RESUME).as_bytes(),
        )
        .await
        .unwrap();

        assert!(resume.id.starts_with("R_"));
        assert_eq!(resume.original_text, SAMPLE_RESUME);
        assert_eq!(resume.file_type.as_deref(), Some("txt"));
        assert!(validation.word_count > 10);

        let path = resume.file_path.clone().unwrap();
        assert!(path.starts_with(uploads.path().join(&user.id).to_str().unwrap()));
        assert!(path.ends_with(&format!("{}_My_Resume.txt", resume.id)));
        assert!(std::path::Path::new(&path).exists());

        let stats = state.vector_store.user_embeddings_stats(&user.id).await;
        assert_eq!(stats.resumes, 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_type_and_oversize() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let mut state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;

        let bad_type =
            handlers::save_uploaded_resume(&state, &user.id, "Exe", "virus.exe", b"MZ").await;
        assert!(matches!(bad_type, Err(ApiError::BadRequest(msg))
            if msg == "Invalid file type. Please upload PDF, DOCX, or TXT files."));

        state.max_upload_bytes = 8;
        let too_big =
            handlers::save_uploaded_resume(&state, &user.id, "Big", "big.txt", b"0123456789").await;
        assert!(matches!(too_big, Err(ApiError::PayloadTooLarge(_))));
    }

    #[tokio::test]
    async fn test_broken_pdf_is_rejected_and_file_removed() {
        let (state_lock, uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;

        let result =
            handlers::save_uploaded_resume(&state, &user.id, "Broken", "cv.pdf", b"not a pdf").await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg.starts_with("Error processing file:")));

        let user_dir = uploads.path().join(&user.id);
        let leftover = std::fs::read_dir(&user_dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_stored_file() {
        let (state_lock, uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        sqlx::query("DROP TABLE resumes").execute(&state.db).await.unwrap();

        let result =
            handlers::save_uploaded_resume(&state, &user.id, "Base", "a.txt", SAMPLE_RESUME.as_bytes())
                .await;
        assert!(matches!(result, Err(ApiError::DatabaseError(_))));

        let user_dir = uploads.path().join(&user.id);
        assert_eq!(std::fs::read_dir(user_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_list_get_update_delete() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let other = test_support::create_user(&state.db, "mallory").await;

        let (resume, _) =
            handlers::save_uploaded_resume(&state, &user.id, "First", "a.txt", SAMPLE_RESUME.as_bytes())
                .await
                .unwrap();

        let Json(list) = handlers::list_resumes(Extension(state_lock.clone()), user.clone())
            .await
            .unwrap();
        assert_eq!(list["resumes"].as_array().unwrap().len(), 1);
        assert_eq!(list["resumes"][0]["cover_letters"], json!({}));

        let foreign = handlers::get_resume(
            Extension(state_lock.clone()),
            other.clone(),
            Path(resume.id.clone()),
        )
        .await;
        assert!(matches!(foreign, Err(ApiError::NotFound(msg)) if msg == "Resume not found"));

        let Json(updated) = handlers::update_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
            Json(UpdateResumeRequest {
                title: Some(" Renamed ".to_string()),
                original_text: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated["resume"]["title"], "Renamed");
        assert_eq!(updated["resume"]["original_text"], SAMPLE_RESUME);

        let empty = handlers::update_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
            Json(UpdateResumeRequest::default()),
        )
        .await;
        assert!(matches!(empty, Err(ApiError::ValidationError(_))));

        let file_path = resume.file_path.clone().unwrap();
        let Json(deleted) = handlers::delete_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(deleted["success"], true);
        assert!(!std::path::Path::new(&file_path).exists());
        assert_eq!(state.vector_store.user_embeddings_stats(&user.id).await.resumes, 0);

        let again =
            handlers::delete_resume(Extension(state_lock), user, Path(resume.id)).await;
        assert!(matches!(again, Err(ApiError::NotFound(_))));
    }

    // ============================================================================
    // Tailoring
    // ============================================================================

    #[tokio::test]
    async fn test_tailor_requires_job_description() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) =
            handlers::save_uploaded_resume(&state, &user.id, "Base", "a.txt", SAMPLE_RESUME.as_bytes())
                .await
                .unwrap();

        let missing = handlers::tailor_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
            Json(TailorRequest::default()),
        )
        .await;
        assert!(matches!(missing, Err(ApiError::BadRequest(msg)) if msg == "Job description is required"));

        let unknown = handlers::tailor_resume(
            Extension(state_lock),
            user,
            Path("R_NOPE00".to_string()),
            Json(TailorRequest { job_description: Some(json!("Rust role")) }),
        )
        .await;
        assert!(matches!(unknown, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_tailor_without_openai_uses_basic_template() {
        if test_support::openai_env_configured() {
            return;
        }
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) =
            handlers::save_uploaded_resume(&state, &user.id, "Base", "a.txt", SAMPLE_RESUME.as_bytes())
                .await
                .unwrap();

        let Json(body) = handlers::tailor_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
            Json(TailorRequest {
                job_description: Some(json!("Senior Rust Engineer at Initech. Experience with Docker and AWS.")),
            }),
        )
        .await
        .unwrap();

        let latex = body["tailored_resume"].as_str().unwrap();
        assert!(latex.contains("\\documentclass"));
        assert_eq!(body["latex_source"], body["tailored_resume"]);
        assert!(body["keywords"]
            .as_array()
            .unwrap()
            .iter()
            .any(|k| k.as_str().map(|s| s.eq_ignore_ascii_case("rust")).unwrap_or(false)));

        let Json(letters) = handlers::get_cover_letters(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(letters["cover_letters"]["versions"].as_array().unwrap().len(), 3);

        let Json(targets) = handlers::list_target_resumes(Extension(state_lock.clone()), user.clone())
            .await
            .unwrap();
        assert_eq!(targets["resumes"][0]["is_tailored"], true);

        let Json(skills) = handlers::get_recommended_skills(Extension(state_lock), user, Path(resume.id))
            .await
            .unwrap();
        assert_eq!(skills["recommended_skills"], json!({}));
    }

    #[tokio::test]
    async fn test_cover_letters_need_job_description() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) =
            handlers::save_uploaded_resume(&state, &user.id, "Base", "a.txt", SAMPLE_RESUME.as_bytes())
                .await
                .unwrap();

        let result =
            handlers::generate_cover_letters(Extension(state_lock), user, Path(resume.id)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(msg))
            if msg == "Missing job description or resume text for cover letter generation."));
    }

    #[tokio::test]
    async fn test_similar_jobs_toggle_persists() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;

        let Json(initial) = handlers::get_similar_jobs_toggle(Extension(state_lock.clone()), user.clone())
            .await
            .unwrap();
        assert_eq!(initial["enabled"], false);

        let Json(on) = handlers::set_similar_jobs_toggle(
            Extension(state_lock.clone()),
            user.clone(),
            Some(Json(json!({"enabled": true}))),
        )
        .await
        .unwrap();
        assert_eq!(on["enabled"], true);

        let Json(read_back) = handlers::get_similar_jobs_toggle(Extension(state_lock.clone()), user.clone())
            .await
            .unwrap();
        assert_eq!(read_back["enabled"], true);

        let Json(off) = handlers::set_similar_jobs_toggle(Extension(state_lock), user, None)
            .await
            .unwrap();
        assert_eq!(off["enabled"], false);
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    #[tokio::test]
    async fn test_preview_plain_resume_and_deprecated_pdf() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) =
            handlers::save_uploaded_resume(&state, &user.id, "Base", "a.txt", SAMPLE_RESUME.as_bytes())
                .await
                .unwrap();

        let page = handlers::preview_resume(
            Extension(state_lock.clone()),
            user.clone(),
            Path(resume.id.clone()),
        )
        .await
        .unwrap()
        .0;
        assert!(page.contains("<h2>EXPERIENCE</h2>"));
        assert!(page.contains("<!DOCTYPE html>"));

        match handlers::preview_resume_pdf(user, Path(resume.id)).await {
            Err(e) => assert_eq!(e.into_response().status(), StatusCode::GONE),
            Ok(_) => panic!("PDF preview should be gone"),
        }
    }

    #[tokio::test]
    async fn test_download_returns_pdf_attachment() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) = handlers::save_uploaded_resume(
            &state,
            &user.id,
            "My Resume",
            "a.txt",
            SAMPLE_RESUME.as_bytes(),
        )
        .await
        .unwrap();

        let response = handlers::download_resume(Extension(state_lock), user, Path(resume.id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"My_Resume.pdf\""
        );
    }

    #[tokio::test]
    async fn test_download_with_control_characters_in_title() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) = handlers::save_uploaded_resume(
            &state,
            &user.id,
            "My\nResume \"v2\"",
            "a.txt",
            SAMPLE_RESUME.as_bytes(),
        )
        .await
        .unwrap();

        let response = handlers::download_resume(Extension(state_lock), user, Path(resume.id))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"My_Resume__v2.pdf\""
        );
    }

    #[tokio::test]
    async fn test_download_falls_back_to_html() {
        let (state_lock, _uploads) = test_support::test_state().await;
        let state = state_lock.read().await.clone();
        let user = test_support::create_user(&state.db, "jane").await;
        let (resume, _) = handlers::save_uploaded_resume(
            &state,
            &user.id,
            "Résumé\t2024",
            "a.txt",
            SAMPLE_RESUME.as_bytes(),
        )
        .await
        .unwrap();

        let response = handlers::download_document(&state, &resume, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"R_sum__2024.html\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("<h2>EXPERIENCE</h2>"));
    }

    #[test]
    fn test_download_stem_keeps_header_safe_characters() {
        let mut resume = Resume {
            id: "R_1".to_string(),
            user_id: "U_1".to_string(),
            title: "  Senior Eng. (Rust) ".to_string(),
            original_text: String::new(),
            tailored_text: None,
            latex_source: None,
            file_path: None,
            file_type: None,
            is_tailored: false,
            job_description: None,
            cover_letters: None,
            recommended_skills: None,
            created_at: None,
            updated_at: None,
        };
        assert_eq!(resume.download_stem(), "Senior_Eng.__Rust");

        resume.title = "\r\n\"".to_string();
        assert_eq!(resume.download_stem(), "resume");
    }
}
