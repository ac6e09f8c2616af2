use std::fs;
use std::path::Path;

use tempfile::tempdir;

use super::*;
use crate::parser::parse_schema;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn generate(schema: &str, output_dir: &Path) -> GenerationReport {
    init_logger();
    let generator = AppGenerator::from_config(&Config::default()).unwrap();
    generator
        .generate(parse_schema(schema).unwrap(), output_dir)
        .unwrap()
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

#[test]
fn test_user_app() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("accounts");

    let report = generate(
        r#"
        syntax = "proto3";

        message User {
            string name = 1;
            int32 age = 2;
        }
        "#,
        &app,
    );

    assert_eq!(report.app_name, "accounts");
    assert_eq!(report.message_count, 1);
    assert_eq!(
        read(&app, "models.py"),
        "from django.db import models\n\
         \n\
         \n\
         class User(models.Model):\n    \
         name = models.CharField(max_length=255)\n    \
         age = models.IntegerField()\n"
    );
    assert_eq!(
        read(&app, "serializers.py"),
        "from rest_framework import serializers\n\
         \n\
         from .models import User\n\
         \n\
         \n\
         class UserSerializer(serializers.ModelSerializer):\n    \
         class Meta:\n        \
         model = User\n        \
         fields = '__all__'\n"
    );
    assert_eq!(
        read(&app, "viewsets.py"),
        "from rest_framework import viewsets\n\
         \n\
         from .models import User\n\
         from .serializers import UserSerializer\n\
         \n\
         \n\
         class UserViewSet(viewsets.ModelViewSet):\n    \
         queryset = User.objects.all()\n    \
         serializer_class = UserSerializer\n"
    );
    assert_eq!(
        read(&app, "urls.py"),
        "from django.urls import include, path\n\
         from rest_framework.routers import DefaultRouter\n\
         \n\
         from .viewsets import UserViewSet\n\
         \n\
         router = DefaultRouter()\n\
         router.register(r'user', UserViewSet)\n\
         \n\
         urlpatterns = [\n    \
         path('', include(router.urls)),\n\
         ]\n"
    );
    assert_eq!(
        read(&app, "admin.py"),
        "from django.contrib import admin\n\
         \n\
         from .models import User\n\
         \n\
         admin.site.register(User)\n"
    );
    assert!(read(&app, "apps.py").contains("class AccountsConfig(AppConfig):\n"));
    assert!(read(&app, "apps.py").contains("    name = 'accounts'\n"));
}

#[test]
fn test_all_files_are_written_in_order() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("shop");

    let report = generate("message Item { string sku = 1; }", &app);

    let written: Vec<_> = report
        .files
        .iter()
        .map(|path| path.strip_prefix(&app).unwrap().to_path_buf())
        .collect();
    let expected: Vec<_> = [
        "__init__.py",
        "migrations/__init__.py",
        "tests.py",
        "models.py",
        "serializers.py",
        "viewsets.py",
        "urls.py",
        "admin.py",
        "apps.py",
    ]
    .iter()
    .map(|file| Path::new(file).to_path_buf())
    .collect();
    assert_eq!(written, expected);

    assert_eq!(read(&app, "__init__.py"), "");
    assert_eq!(read(&app, "migrations/__init__.py"), "");
    assert_eq!(read(&app, "tests.py"), "# placeholder\n");
}

#[test]
fn test_repeated_field_is_a_plain_column() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("blog");

    generate("message Post { repeated string tags = 1; }", &app);

    assert!(read(&app, "models.py").contains("    tags = models.CharField(max_length=255)\n"));
}

#[test]
fn test_unknown_type_becomes_foreign_key_and_is_reported() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("library");

    let report = generate("message Book { Author author = 1; }", &app);

    assert!(read(&app, "models.py")
        .contains("    author = models.ForeignKey(Author, on_delete=models.CASCADE)\n"));
    assert_eq!(
        report.dangling_references,
        vec![DanglingReference {
            message: "Book".to_string(),
            field: "author".to_string(),
            target: "Author".to_string(),
        }]
    );
}

#[test]
fn test_reference_to_defined_message_is_not_dangling() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("library");

    let report = generate(
        "message Author { string name = 1; } message Book { Author author = 1; }",
        &app,
    );

    assert!(report.dangling_references.is_empty());
    let models = read(&app, "models.py");
    let author = models.find("class Author(models.Model):").unwrap();
    let book = models.find("class Book(models.Model):").unwrap();
    assert!(author < book);
}

#[test]
fn test_empty_message_renders_pass() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("misc");

    generate("message Empty {}", &app);

    assert_eq!(
        read(&app, "models.py"),
        "from django.db import models\n\n\nclass Empty(models.Model):\n    pass\n"
    );
}

#[test]
fn test_schema_without_messages() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("nothing");

    let report = generate("syntax = \"proto3\";\npackage nothing;\n", &app);

    assert_eq!(report.message_count, 0);
    assert_eq!(report.files.len(), 9);
    assert_eq!(read(&app, "models.py"), "from django.db import models\n");
    assert!(!read(&app, "admin.py").contains("register"));
}

#[test]
fn test_generation_is_deterministic() {
    let schema = "message A { string x = 1; B b = 2; } message B { bool flag = 1; }";
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();

    let first_report = generate(schema, &first.path().join("app"));
    let second_report = generate(schema, &second.path().join("app"));

    assert_eq!(first_report.files.len(), second_report.files.len());
    for (left, right) in first_report.files.iter().zip(&second_report.files) {
        assert_eq!(fs::read(left).unwrap(), fs::read(right).unwrap());
    }
}

#[test]
fn test_existing_files_are_overwritten() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("accounts");
    fs::create_dir_all(&app).unwrap();
    fs::write(app.join("models.py"), "stale content that is longer than the new file\n".repeat(20))
        .unwrap();

    generate("message User {}", &app);

    assert_eq!(
        read(&app, "models.py"),
        "from django.db import models\n\n\nclass User(models.Model):\n    pass\n"
    );
}

#[test]
fn test_output_dir_under_a_file_fails() {
    init_logger();
    let temp_dir = tempdir().unwrap();
    let blocker = temp_dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();

    let generator = AppGenerator::from_config(&Config::default()).unwrap();
    let err = generator
        .generate(parse_schema("message User {}").unwrap(), blocker.join("app"))
        .unwrap_err();

    assert!(matches!(err, GenerationError::DirectoryCreation { .. }));
}

#[test]
fn test_config_string_max_length() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("accounts");
    let config = Config {
        string_max_length: 64,
        ..Config::default()
    };

    let generator = AppGenerator::from_config(&config).unwrap();
    generator
        .generate(parse_schema("message User { string name = 1; }").unwrap(), &app)
        .unwrap();

    assert!(read(&app, "models.py").contains("name = models.CharField(max_length=64)"));
}

#[test]
fn test_config_template_overrides() {
    let temp_dir = tempdir().unwrap();
    let template_dir = temp_dir.path().join("templates");
    fs::create_dir(&template_dir).unwrap();
    fs::write(
        template_dir.join("admin.jinja"),
        "from django.contrib import admin\n\n{% for message in messages %}\nadmin.site.register(models.{{ message.name }})\n{% endfor %}\n",
    )
    .unwrap();
    let config = Config {
        template_dir: Some(template_dir),
        ..Config::default()
    };
    let app = temp_dir.path().join("accounts");

    let generator = AppGenerator::from_config(&config).unwrap();
    generator
        .generate(parse_schema("message User {}").unwrap(), &app)
        .unwrap();

    assert_eq!(
        read(&app, "admin.py"),
        "from django.contrib import admin\n\nadmin.site.register(models.User)\n"
    );
    assert!(read(&app, "models.py").contains("class User(models.Model):"));
}

#[test]
fn test_broken_template_override_fails_before_writing() {
    let temp_dir = tempdir().unwrap();
    let template_dir = temp_dir.path().join("templates");
    fs::create_dir(&template_dir).unwrap();
    fs::write(template_dir.join("urls.jinja"), "{% if %}").unwrap();
    let config = Config {
        template_dir: Some(template_dir),
        ..Config::default()
    };

    match AppGenerator::from_config(&config) {
        Err(GenerationError::TemplateSyntax { name, .. }) => assert_eq!(name, "urls"),
        Err(other) => panic!("expected TemplateSyntax, got {:?}", other),
        Ok(_) => panic!("expected TemplateSyntax, got a generator"),
    }
}

#[test]
fn test_mapper_extension_reaches_models() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("files");

    let mut generator = AppGenerator::from_config(&Config::default()).unwrap();
    generator
        .mapper_mut()
        .register("bytes", |_| "models.BinaryField()".to_string());
    let report = generator
        .generate(parse_schema("message Blob { bytes data = 1; }").unwrap(), &app)
        .unwrap();

    assert!(read(&app, "models.py").contains("    data = models.BinaryField()\n"));
    assert!(report.dangling_references.is_empty());
}

#[test]
fn test_dotted_types_render_importable_relations() {
    let temp_dir = tempdir().unwrap();
    let app = temp_dir.path().join("library");

    let report = generate(
        r#"
        message Author { string name = 1; }
        message Book {
            .Author author = 1;
            library.v1.Author editor = 2;
            google.protobuf.Timestamp published_at = 3;
        }
        "#,
        &app,
    );

    let models = read(&app, "models.py");
    assert!(models.contains("    author = models.ForeignKey(Author, on_delete=models.CASCADE)\n"));
    assert!(models.contains("    editor = models.ForeignKey(Author, on_delete=models.CASCADE)\n"));
    assert!(models
        .contains("    published_at = models.ForeignKey(Timestamp, on_delete=models.CASCADE)\n"));
    assert!(!models.contains("ForeignKey(."));

    assert_eq!(
        report.dangling_references,
        vec![DanglingReference {
            message: "Book".to_string(),
            field: "published_at".to_string(),
            target: "google.protobuf.Timestamp".to_string(),
        }]
    );
}
