//! Widgets working together the way the admin pages use them.

use std::sync::Arc;

use adminkit_core::files::{OnPremiseFileManager, UploadedFile};
use adminkit_core::i18n::I18nTranslator;
use adminkit_core::AdminError;
use adminkit_http::FormData;
use adminkit_template::Templates;
use adminkit_widgets::displays::{self, Display};
use adminkit_widgets::filters::{self, Filter};
use adminkit_widgets::inputs::{self, Input};
use adminkit_widgets::options::{EnumChoices, StaticOptions};
use adminkit_widgets::RenderContext;
use serde_json::{json, Value};

fn templates() -> Templates {
    Templates::new(Arc::new(I18nTranslator::builder().build().unwrap())).unwrap()
}

// ============ Form round trip ============

#[tokio::test]
async fn test_parse_every_input_of_a_form() {
    let mut title = inputs::Text::new();
    title.bind("title", "Title");
    let mut status = inputs::Enum::new(EnumChoices::ints([("on", 1), ("off", 0)]));
    status.bind("status", "Status");
    let mut published = inputs::Switch::new();
    published.bind("published", "Published");
    let mut meta = inputs::Json::new().null(true);
    meta.bind("meta", "Meta");

    let fields: Vec<Box<dyn Input>> = vec![
        Box::new(title),
        Box::new(status),
        Box::new(published),
        Box::new(meta),
    ];

    let form = FormData::from_urlencoded(b"title=Hello&status=0&meta=");
    let mut parsed = Vec::new();
    for field in &fields {
        parsed.push((field.name().to_string(), field.parse(&form).await.unwrap()));
    }

    assert_eq!(
        parsed,
        vec![
            ("title".to_string(), Some(json!("Hello"))),
            ("status".to_string(), Some(json!(0))),
            ("published".to_string(), Some(json!(false))),
            ("meta".to_string(), Some(Value::Null)),
        ]
    );
}

#[tokio::test]
async fn test_uploaded_image_is_stored_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let manager = OnPremiseFileManager::new(dir.path()).allow_extensions(["png"]);
    let mut avatar = inputs::File::image(Arc::new(manager));
    avatar.bind("avatar", "Avatar");

    let mut form = FormData::new();
    form.push_file(
        "avatar",
        UploadedFile::new("me.png", "image/png", b"\x89PNG".to_vec()),
    );
    let location = avatar.parse(&form).await.unwrap().unwrap();
    let path = location.as_str().unwrap();
    assert_eq!(std::fs::read(path).unwrap(), b"\x89PNG");

    let mut rejected = FormData::new();
    rejected.push_file("avatar", UploadedFile::new("me.exe", "application/x", b"MZ".to_vec()));
    assert!(matches!(
        avatar.parse(&rejected).await,
        Err(AdminError::FileExtNotAllowed { .. })
    ));
}

// ============ Rendering ============

#[tokio::test]
async fn test_inputs_render_in_ukrainian() {
    let t = templates();
    let cx = RenderContext::new(&t, "uk");
    let mut active = filters::Boolean::new("is_active");
    active.set_label("Active");
    let html = active.render(&cx, None).await.unwrap();
    assert!(html.contains(&t.gettext("TRUE", "uk")));
    assert!(!html.contains(">True<"));
}

#[tokio::test]
async fn test_select_with_static_options() {
    let t = templates();
    let cx = RenderContext::new(&t, "en");
    let mut category = inputs::Select::foreign_key(Arc::new(StaticOptions::new([
        ("News", 1),
        ("Blog", 2),
    ])));
    category.bind("category_id", "Category");
    let html = category.render(&cx, &json!(2)).await.unwrap();
    assert!(html.contains("<option value=\"2\" selected>Blog</option>"));
    assert!(html.contains(" required"));
}

#[tokio::test]
async fn test_displays_for_a_row() {
    let t = templates();
    let cx = RenderContext::new(&t, "en");
    let columns: Vec<(Box<dyn Display>, Value)> = vec![
        (Box::new(displays::Raw::new()), json!(7)),
        (Box::new(displays::Boolean::new()), json!(0)),
        (
            Box::new(displays::DatetimeDisplay::default()),
            json!("2024-03-01T09:15:00"),
        ),
        (Box::new(displays::Raw::new()), Value::Null),
    ];
    let mut cells = Vec::new();
    for (display, value) in &columns {
        cells.push(display.render(&cx, value).await.unwrap());
    }
    assert_eq!(cells[0], "7");
    assert!(cells[1].contains("False"));
    assert_eq!(cells[2], "2024-03-01 09:15:00");
    assert_eq!(cells[3], "");
}

#[tokio::test]
async fn test_folder_template_overrides_widget() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("widgets/displays")).unwrap();
    std::fs::write(
        dir.path().join("widgets/displays/json.html"),
        "<code>{{ value }}</code>",
    )
    .unwrap();
    let t = Templates::with_dirs(
        Arc::new(I18nTranslator::builder().build().unwrap()),
        vec![dir.path().to_path_buf()],
    )
    .unwrap();
    let cx = RenderContext::new(&t, "en");
    let html = displays::Json::new().render(&cx, &json!(1)).await.unwrap();
    assert_eq!(html, "<code>1</code>");
}
