//! Framework-specific prompt templates and dependency pins.
//!
//! Three closed registries — frontend, backend, database — map each stack
//! identifier to the guidance that turns a generic generation request into
//! framework-accurate output. Every code-emitting stage prompt receives the
//! full `core_instructions` string; callers must never truncate it.

use super::{Backend, Database, Frontend};

/// Template record for one stack identifier.
#[derive(Debug, Clone, Copy)]
pub struct StackTemplate {
    /// Framework guidance always emitted into stage prompts, in full.
    pub core_instructions: &'static str,
    /// Styling guidance (frontend templates only; empty otherwise).
    pub styling_requirements: &'static str,
    /// Runtime package specifiers with pinned versions or tight ranges.
    pub dependencies: &'static [&'static str],
    /// Development/tooling package specifiers.
    pub dev_dependencies: &'static [&'static str],
}

/// Look up the template for a frontend framework.
///
/// Total over the closed enum — parsing already rejected unknown identifiers.
pub fn frontend(frontend: Frontend) -> StackTemplate {
    match frontend {
        Frontend::React => REACT,
        Frontend::Vue => VUE,
        Frontend::Angular => ANGULAR,
        Frontend::Html => HTML,
    }
}

/// Look up the template for a backend framework.
pub fn backend(backend: Backend) -> StackTemplate {
    match backend {
        Backend::FastApi => FASTAPI,
        Backend::Flask => FLASK,
        Backend::Express => EXPRESS,
        Backend::Django => DJANGO,
        Backend::DotNet => DOTNET,
    }
}

/// Look up the template for a database.
pub fn database(database: Database) -> StackTemplate {
    match database {
        Database::PostgreSql => POSTGRESQL,
        Database::MySql => MYSQL,
        Database::MongoDb => MONGODB,
        Database::Sqlite => SQLITE,
        Database::Redis => REDIS,
    }
}

// ============================================================================
// Frontend templates
// ============================================================================

const REACT: StackTemplate = StackTemplate {
    core_instructions: "\
Generate React 18 code with TypeScript.
- Functional components only, typed with explicit prop interfaces.
- Use hooks (useState, useEffect, useMemo, useCallback) for state and effects; \
no class components.
- Routing via react-router-dom v6: <Routes>/<Route> with element props, \
useNavigate for programmatic navigation.
- Data fetching through a shared typed API client module (axios instance with \
a baseURL from VITE_API_URL); never call fetch inline in components.
- Co-locate component-specific types; shared domain types live under the \
shared types directory.
- Entry point uses createRoot from react-dom/client.
- Vite is the build tool: index.html at the project root referencing \
/src/main.tsx, vite.config.ts with the @vitejs/plugin-react plugin.
- Every list rendering uses a stable key; every async effect cleans up.",
    styling_requirements: "\
Style with Tailwind CSS utility classes directly in JSX.
- tailwind.config.js with the content globs for ./index.html and ./src/**/*.{ts,tsx}.
- A single src/index.css containing the three @tailwind directives.
- Responsive layout via sm:/md:/lg: prefixes; no inline style attributes.",
    dependencies: &[
        "react@^18.3.0",
        "react-dom@^18.3.0",
        "react-router-dom@^6.26.0",
        "axios@^1.7.0",
    ],
    dev_dependencies: &[
        "typescript@^5.5.0",
        "vite@^5.4.0",
        "@vitejs/plugin-react@^4.3.0",
        "@types/react@^18.3.0",
        "@types/react-dom@^18.3.0",
        "tailwindcss@^3.4.0",
        "autoprefixer@^10.4.0",
        "postcss@^8.4.0",
    ],
};

const VUE: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Vue 3 code with TypeScript.
- Single-file components using <script setup lang=\"ts\">.
- Composition API exclusively: ref/reactive/computed/watch; no Options API.
- Routing via vue-router v4 with createWebHistory; route components lazy-loaded.
- State shared through Pinia stores (defineStore with setup syntax).
- Data fetching through a shared typed API client module (axios instance); \
never call fetch inline in components.
- Entry point creates the app with createApp(App).use(router).use(pinia).mount('#app').
- Vite is the build tool: index.html at the project root referencing /src/main.ts.",
    styling_requirements: "\
Style with scoped <style> blocks per component plus a small global stylesheet.
- Use CSS custom properties for the palette in src/assets/main.css.
- Mobile-first media queries; flexbox/grid for layout.",
    dependencies: &[
        "vue@^3.4.0",
        "vue-router@^4.4.0",
        "pinia@^2.2.0",
        "axios@^1.7.0",
    ],
    dev_dependencies: &[
        "typescript@^5.5.0",
        "vite@^5.4.0",
        "@vitejs/plugin-vue@^5.1.0",
        "vue-tsc@^2.0.0",
    ],
};

const ANGULAR: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Angular 18 code with TypeScript.
- Standalone components only (standalone: true); no NgModules.
- Signals for local state; RxJS observables for async streams.
- Dependency injection via inject() in field initializers.
- Routing through provideRouter with lazy loadComponent routes in app.routes.ts.
- HTTP through a typed service layer wrapping HttpClient (provideHttpClient); \
components never touch HttpClient directly.
- Templates in separate .html files next to their components.
- Bootstrap via bootstrapApplication(AppComponent, appConfig) in main.ts.",
    styling_requirements: "\
Style with per-component .css files plus src/styles.css for globals.
- BEM-ish class naming; CSS custom properties for the palette.
- No deep selectors; keep component styles encapsulated.",
    dependencies: &[
        "@angular/core@^18.1.0",
        "@angular/common@^18.1.0",
        "@angular/router@^18.1.0",
        "@angular/forms@^18.1.0",
        "rxjs@^7.8.0",
        "zone.js@^0.14.0",
    ],
    dev_dependencies: &[
        "@angular/cli@^18.1.0",
        "@angular-devkit/build-angular@^18.1.0",
        "typescript@^5.5.0",
    ],
};

const HTML: StackTemplate = StackTemplate {
    core_instructions: "\
Generate plain HTML5/CSS/JavaScript without a framework or build step.
- Semantic HTML: header/nav/main/section/footer; one h1 per page.
- ES modules loaded with <script type=\"module\">; no bundler assumptions.
- DOM manipulation through small focused functions; event delegation for lists.
- API calls with fetch wrapped in a shared js/api.js module that handles \
JSON parsing and error states.
- Pages are separate .html files sharing a common css/ and js/ directory.",
    styling_requirements: "\
Style with hand-written CSS in css/styles.css.
- CSS custom properties for palette and spacing scale.
- Flexbox/grid layout, mobile-first media queries, no CSS frameworks.",
    dependencies: &[],
    dev_dependencies: &[],
};

// ============================================================================
// Backend templates
// ============================================================================

const FASTAPI: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Python 3.11+ FastAPI code.
- App factory in main.py: create_app() returning a FastAPI instance with \
CORS middleware and routers included via app.include_router.
- Routes grouped by resource in an APIRouter per module under routes/, each \
with a prefix and tags.
- Request/response schemas as Pydantic v2 models (BaseModel, ConfigDict, \
model_validate) in a schemas module, separate from ORM models.
- Database access through SQLAlchemy 2.0 async sessions injected with \
Depends(get_db); no raw session globals.
- Auth endpoints issue JWTs (python-jose); protected routes depend on a \
get_current_user dependency reading the bearer token.
- Settings via pydantic-settings BaseSettings reading environment variables.
- Every handler is async def and returns typed response models.",
    styling_requirements: "",
    dependencies: &[
        "fastapi==0.112.0",
        "uvicorn[standard]==0.30.5",
        "sqlalchemy==2.0.32",
        "pydantic==2.8.2",
        "pydantic-settings==2.4.0",
        "python-jose[cryptography]==3.3.0",
        "passlib[bcrypt]==1.7.4",
        "python-multipart==0.0.9",
    ],
    dev_dependencies: &["pytest==8.3.2", "httpx==0.27.0", "pytest-asyncio==0.23.8"],
};

const FLASK: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Python 3.11+ Flask code.
- Application factory pattern: create_app() in app/__init__.py registering \
blueprints and extensions.
- One blueprint per resource under app/routes/, registered with url_prefix.
- Models via Flask-SQLAlchemy (db.Model subclasses) in app/models/.
- Request validation with marshmallow schemas; serialize responses through \
schema.dump, never jsonify ORM objects directly.
- Auth with Flask-JWT-Extended: create_access_token on login, @jwt_required() \
on protected routes.
- Configuration classes in config.py selected by FLASK_ENV.
- Errors handled by registered error handlers returning JSON bodies.",
    styling_requirements: "",
    dependencies: &[
        "flask==3.0.3",
        "flask-sqlalchemy==3.1.1",
        "flask-jwt-extended==4.6.0",
        "flask-cors==4.0.1",
        "marshmallow==3.21.3",
        "python-dotenv==1.0.1",
    ],
    dev_dependencies: &["pytest==8.3.2", "pytest-flask==1.3.0"],
};

const EXPRESS: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Node.js Express code with TypeScript.
- App assembly in src/app.ts (middleware, routers, error handler) separate \
from the listen call in src/index.ts.
- One Router per resource under src/routes/, mounted with app.use and a path \
prefix; controllers hold handler logic, routes only wire paths.
- Async handlers wrapped so rejections reach the central error middleware; \
the error middleware is the last app.use and returns JSON error bodies.
- Validation with zod schemas parsed at the top of each handler.
- Auth with jsonwebtoken: sign on login, verify in an auth middleware that \
attaches the user to req.
- Configuration from process.env through a single typed config module using \
dotenv.
- tsconfig targets ES2022 modules with strict mode on.",
    styling_requirements: "",
    dependencies: &[
        "express@^4.19.0",
        "cors@^2.8.5",
        "jsonwebtoken@^9.0.2",
        "bcryptjs@^2.4.3",
        "zod@^3.23.0",
        "dotenv@^16.4.0",
    ],
    dev_dependencies: &[
        "typescript@^5.5.0",
        "tsx@^4.16.0",
        "@types/express@^4.17.21",
        "@types/cors@^2.8.17",
        "@types/jsonwebtoken@^9.0.6",
        "@types/bcryptjs@^2.4.6",
    ],
};

const DJANGO: StackTemplate = StackTemplate {
    core_instructions: "\
Generate Python 3.11+ Django 5 code with Django REST Framework.
- Project package with settings.py/urls.py/wsgi.py plus one app per domain \
area created with startapp conventions.
- Models in each app's models.py with explicit Meta ordering and __str__.
- API via DRF: ModelSerializer classes in serializers.py, ViewSets in \
views.py, routes registered through a DefaultRouter in urls.py.
- Auth with djangorestframework-simplejwt: TokenObtainPairView/TokenRefreshView \
wired in urls.py, IsAuthenticated on protected viewsets.
- Settings read secrets from environment variables via os.environ; never \
hard-code SECRET_KEY in committed settings.
- Migrations are expected output: include initial migration files per app.",
    styling_requirements: "",
    dependencies: &[
        "django==5.0.8",
        "djangorestframework==3.15.2",
        "djangorestframework-simplejwt==5.3.1",
        "django-cors-headers==4.4.0",
        "python-dotenv==1.0.1",
    ],
    dev_dependencies: &["pytest==8.3.2", "pytest-django==4.8.0"],
};

const DOTNET: StackTemplate = StackTemplate {
    core_instructions: "\
Generate C# ASP.NET Core 8 Web API code.
- Program.cs uses the minimal hosting model: WebApplication.CreateBuilder, \
service registration (AddControllers, AddDbContext, AddAuthentication), then \
app.MapControllers().
- Attribute-routed controllers under Controllers/ inheriting ControllerBase \
with [ApiController] and [Route(\"api/[controller]\")].
- Entity Framework Core: a DbContext under Data/ with DbSet<T> per entity, \
entities under Models/ with data annotations, DTOs under Dtos/ — never \
return entities directly from controllers.
- Async actions returning ActionResult<T>; services injected through \
constructor injection and registered in Program.cs.
- JWT bearer auth via Microsoft.AspNetCore.Authentication.JwtBearer with \
[Authorize] on protected controllers.
- Configuration through appsettings.json + IConfiguration binding; the \
project file is a .csproj targeting net8.0 with nullable enabled.",
    styling_requirements: "",
    dependencies: &[
        "Microsoft.EntityFrameworkCore@8.0.8",
        "Microsoft.EntityFrameworkCore.Design@8.0.8",
        "Microsoft.AspNetCore.Authentication.JwtBearer@8.0.8",
        "Npgsql.EntityFrameworkCore.PostgreSQL@8.0.4",
        "BCrypt.Net-Next@4.0.3",
    ],
    dev_dependencies: &["Swashbuckle.AspNetCore@6.7.0"],
};

// ============================================================================
// Database templates
// ============================================================================

const POSTGRESQL: StackTemplate = StackTemplate {
    core_instructions: "\
Use PostgreSQL 16.
- Schema as explicit CREATE TABLE statements with SERIAL or IDENTITY primary \
keys, NOT NULL constraints, and foreign keys with ON DELETE behavior stated.
- snake_case table and column names; plural table names.
- created_at/updated_at TIMESTAMPTZ columns defaulting to now().
- Indexes on every foreign key and on columns used in WHERE clauses.
- Connection via environment DATABASE_URL; include a seed script with \
representative rows.",
    styling_requirements: "",
    dependencies: &["postgresql-client>=16"],
    dev_dependencies: &[],
};

const MYSQL: StackTemplate = StackTemplate {
    core_instructions: "\
Use MySQL 8.
- Schema as explicit CREATE TABLE statements with AUTO_INCREMENT primary \
keys, InnoDB engine, utf8mb4 charset.
- snake_case table and column names; plural table names.
- created_at/updated_at TIMESTAMP columns with DEFAULT CURRENT_TIMESTAMP and \
ON UPDATE CURRENT_TIMESTAMP.
- Foreign keys declared with explicit CONSTRAINT names.
- Connection via environment DATABASE_URL; include a seed script.",
    styling_requirements: "",
    dependencies: &["mysql-client>=8.0"],
    dev_dependencies: &[],
};

const MONGODB: StackTemplate = StackTemplate {
    core_instructions: "\
Use MongoDB 7.
- Collections documented as JSON Schema validators (db.createCollection with \
$jsonSchema) rather than migration files.
- camelCase field names; singular collection names are acceptable, stay \
consistent.
- Embed one-to-few relations; reference one-to-many with ObjectId fields and \
an index on every referenced field.
- Connection via environment MONGODB_URI; include an init script creating \
collections, validators, and indexes.",
    styling_requirements: "",
    dependencies: &["mongodb>=7.0"],
    dev_dependencies: &[],
};

const SQLITE: StackTemplate = StackTemplate {
    core_instructions: "\
Use SQLite 3.
- Schema as a single schema.sql with CREATE TABLE IF NOT EXISTS statements, \
INTEGER PRIMARY KEY AUTOINCREMENT keys, and foreign_keys pragma noted.
- snake_case table and column names; plural table names.
- created_at TEXT columns defaulting to CURRENT_TIMESTAMP.
- The database file path comes from configuration, defaulting to ./data/app.db.",
    styling_requirements: "",
    dependencies: &[],
    dev_dependencies: &[],
};

const REDIS: StackTemplate = StackTemplate {
    core_instructions: "\
Use Redis 7 as the primary store.
- Document the keyspace in a KEYSPACE.md: key patterns (e.g. user:{id}, \
session:{token}), value encodings (JSON strings or hashes), and TTLs.
- Hashes for entities, sets/sorted-sets for indexes and ordering, and \
explicit SCAN-friendly key prefixes.
- All access through a small repository layer; no ad-hoc key construction in \
handlers.
- Connection via environment REDIS_URL.",
    styling_requirements: "",
    dependencies: &["redis>=7.0"],
    dev_dependencies: &[],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_frontend_has_nonempty_instructions_and_styling() {
        for f in Frontend::ALL {
            let t = frontend(f);
            assert!(
                !t.core_instructions.is_empty(),
                "{f} missing core instructions"
            );
            assert!(
                !t.styling_requirements.is_empty(),
                "{f} missing styling requirements"
            );
        }
    }

    #[test]
    fn every_backend_has_nonempty_instructions() {
        for b in Backend::ALL {
            let t = backend(b);
            assert!(
                !t.core_instructions.is_empty(),
                "{b} missing core instructions"
            );
            assert!(t.styling_requirements.is_empty());
        }
    }

    #[test]
    fn every_database_has_nonempty_instructions() {
        for d in Database::ALL {
            let t = database(d);
            assert!(
                !t.core_instructions.is_empty(),
                "{d} missing core instructions"
            );
        }
    }

    #[test]
    fn dependency_specifiers_carry_versions() {
        // Runtime pins must name a version or tight range; bare names drift.
        for b in Backend::ALL {
            for dep in backend(b).dependencies {
                assert!(
                    dep.contains('@') || dep.contains("==") || dep.contains(">="),
                    "unpinned dependency '{dep}' for {b}"
                );
            }
        }
    }

    #[test]
    fn dotnet_template_is_csharp_not_python() {
        let t = backend(Backend::DotNet);
        assert!(t.core_instructions.contains("Program.cs"));
        assert!(t.core_instructions.contains("DbContext"));
        assert!(!t.core_instructions.contains("FastAPI"));
        assert!(!t.core_instructions.contains("def "));
    }

    #[test]
    fn react_template_names_vite_entry() {
        let t = frontend(Frontend::React);
        assert!(t.core_instructions.contains("/src/main.tsx"));
    }
}
