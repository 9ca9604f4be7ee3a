//! Static catalogs: the personas of the squad, the integrations a user can
//! enable, and the starter templates.

use std::fmt::{self, Display};

/// The role a persona plays in the team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PersonaRole {
    TeamLeader,
    ProductManager,
    Architect,
    Engineer,
    DataAnalyst,
}

impl PersonaRole {
    /// Returns the human-readable role title.
    pub const fn title(self) -> &'static str {
        match self {
            PersonaRole::TeamLeader => "Team Leader",
            PersonaRole::ProductManager => "Product Manager",
            PersonaRole::Architect => "Architect",
            PersonaRole::Engineer => "Engineer",
            PersonaRole::DataAnalyst => "Data Analyst",
        }
    }
}

impl Display for PersonaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Styling tokens of a persona, in utility-class notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct ColorTokens {
    pub accent: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub background: &'static str,
}

/// A simulated team member the model role-plays as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Persona {
    /// Stable identifier, e.g. `leader`.
    pub id: &'static str,
    pub role: PersonaRole,
    /// Display name the model uses in speaker headers.
    pub name: &'static str,
    pub description: &'static str,
    /// Font Awesome icon class.
    pub icon: &'static str,
    pub colors: ColorTokens,
    /// Behavioral instruction, only used to compose the system instruction.
    pub prompt_snippet: &'static str,
}

impl Persona {
    /// Returns `true` if `label` names this persona, either by display name
    /// or by role title. Case-insensitive.
    pub fn answers_to(&self, label: &str) -> bool {
        self.name.eq_ignore_ascii_case(label)
            || self.role.title().eq_ignore_ascii_case(label)
    }
}

/// An integration the user can enable for the project.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Tool {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

/// A canned project prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub prompt: &'static str,
}

/// The squad, in speaking order.
pub static PERSONAS: [Persona; 5] = [
    Persona {
        id: "leader",
        role: PersonaRole::TeamLeader,
        name: "Atlas",
        description: "Coordinates the team, clarifies requirements, and \
                      ensures project goals are met.",
        icon: "fa-user-tie",
        colors: ColorTokens {
            accent: "blue-500",
            text: "text-blue-400",
            border: "border-blue-500",
            background: "bg-blue-500/10",
        },
        prompt_snippet: "You are Atlas, the Team Leader. You coordinate the \
                         team. If the user request is vague, ask clarifying \
                         questions. Delegate tasks to other agents by \
                         mentioning them. Keep the project on track.",
    },
    Persona {
        id: "pm",
        role: PersonaRole::ProductManager,
        name: "Sarah",
        description: "Defines user stories, features, and business value. \
                      Focuses on UX and \"why\" we are building this.",
        icon: "fa-clipboard-list",
        colors: ColorTokens {
            accent: "purple-500",
            text: "text-purple-400",
            border: "border-purple-500",
            background: "bg-purple-500/10",
        },
        prompt_snippet: "You are Sarah, the Product Manager. You focus on \
                         user experience, features, and business logic. \
                         Create user stories and requirements.",
    },
    Persona {
        id: "architect",
        role: PersonaRole::Architect,
        name: "Marcus",
        description: "Designs the system architecture, chooses the tech \
                      stack, and ensures scalability and security.",
        icon: "fa-sitemap",
        colors: ColorTokens {
            accent: "orange-500",
            text: "text-orange-400",
            border: "border-orange-500",
            background: "bg-orange-500/10",
        },
        prompt_snippet: "You are Marcus, the System Architect. You decide on \
                         the technology stack, data structure, and overall \
                         system design. VISUALIZATION RULE: When defining \
                         architecture or flow, you MUST generate a Mermaid \
                         diagram wrapped in ```mermaid``` blocks to visualize \
                         the system.",
    },
    Persona {
        id: "engineer",
        role: PersonaRole::Engineer,
        name: "Neo",
        description: "Writes the code, implements features, and fixes bugs. \
                      Speaks in code blocks and technical details.",
        icon: "fa-code",
        colors: ColorTokens {
            accent: "green-500",
            text: "text-green-400",
            border: "border-green-500",
            background: "bg-green-500/10",
        },
        prompt_snippet: "You are Neo, the Lead Engineer. You write the actual \
                         code. IMPORTANT: When building web prototypes, \
                         PREFER generating a single-file HTML solution (with \
                         embedded CSS/JS) or use a CDN-based React approach \
                         in a single file so the user can preview it \
                         immediately. Always wrap code in markdown blocks.",
    },
    Persona {
        id: "analyst",
        role: PersonaRole::DataAnalyst,
        name: "Chloe",
        description: "Analyzes data, defines metrics, and helps with \
                      database schema and reporting.",
        icon: "fa-chart-line",
        colors: ColorTokens {
            accent: "teal-500",
            text: "text-teal-400",
            border: "border-teal-500",
            background: "bg-teal-500/10",
        },
        prompt_snippet: "You are Chloe, the Data Analyst. You focus on data \
                         structures, analytics, KPI tracking, and insights. \
                         VISUALIZATION RULE: When defining database schemas, \
                         generate a Mermaid ER Diagram wrapped in \
                         ```mermaid``` blocks.",
    },
];

/// Integrations the user can enable.
pub static TOOLS: [Tool; 6] = [
    Tool {
        id: "github",
        name: "GitHub",
        description: "Version control, CI/CD actions, and project management.",
        icon: "fa-github",
        color: "text-white",
    },
    Tool {
        id: "supabase",
        name: "Supabase",
        description: "Open source Firebase alternative. Database, Auth, \
                      Storage.",
        icon: "fa-database",
        color: "text-emerald-400",
    },
    Tool {
        id: "vercel",
        name: "Vercel",
        description: "Frontend cloud for deploying Next.js and React apps.",
        icon: "fa-triangle-exclamation",
        color: "text-white",
    },
    Tool {
        id: "stripe",
        name: "Stripe",
        description: "Payment processing for e-commerce and subscriptions.",
        icon: "fa-credit-card",
        color: "text-indigo-400",
    },
    Tool {
        id: "openai",
        name: "OpenAI API",
        description: "Integration for advanced AI features and embeddings.",
        icon: "fa-microchip",
        color: "text-teal-300",
    },
    Tool {
        id: "firebase",
        name: "Firebase",
        description: "Google backend-as-a-service for apps and web.",
        icon: "fa-fire",
        color: "text-orange-400",
    },
];

/// Starter projects.
pub static TEMPLATES: [Template; 6] = [
    Template {
        id: "landing-page",
        name: "Modern Landing Page",
        description: "High-converting landing page with hero section, \
                      features, testimonials, and responsive design.",
        icon: "fa-laptop-code",
        prompt: "Build a modern, responsive landing page using HTML, Tailwind \
                 CSS (via CDN), and Vanilla JS in a single index.html file. \
                 It should have a sticky header, a hero section with a call \
                 to action, a features grid, social proof/testimonials, and a \
                 footer. Focus on clean UI/UX and mobile responsiveness.",
    },
    Template {
        id: "blog-platform",
        name: "Tech Blog Platform",
        description: "Full-featured blog architecture with markdown support, \
                      categories, and author profiles.",
        icon: "fa-blog",
        prompt: "Create a blog platform architecture. Users should be able to \
                 view posts, filter by category, and read author profiles. \
                 Define a schema for posts (title, slug, content, author, \
                 date). Suggest a stack using Next.js or similar.",
    },
    Template {
        id: "ecommerce-dashboard",
        name: "E-commerce Dashboard",
        description: "Admin dashboard for managing products, orders, and \
                      viewing real-time sales analytics.",
        icon: "fa-chart-pie",
        prompt: "Design and build an E-commerce Admin Dashboard as a single \
                 HTML file using Bootstrap or Tailwind via CDN and Vue.js or \
                 React (CDN). Key features: Product management table (CRUD \
                 simulation), Order status overview with charts (use \
                 Chart.js), and a sidebar navigation.",
    },
    Template {
        id: "snake-game",
        name: "Snake Game",
        description: "Classic arcade Snake game playable in the browser using \
                      HTML5 Canvas.",
        icon: "fa-gamepad",
        prompt: "Develop the classic Snake game using HTML5 Canvas and \
                 JavaScript in a single index.html file. Features: Score \
                 tracking, increasing speed as you eat, and a game over state \
                 with restart functionality. Ensure it is controllable via \
                 keyboard arrows.",
    },
    Template {
        id: "python-scraper",
        name: "Web Scraper & Analyzer",
        description: "Python script to scrape data from a website and perform \
                      basic text analysis.",
        icon: "fa-robot",
        prompt: "Write a Python script using BeautifulSoup and Requests to \
                 scrape titles from a news website. Then, perform a basic \
                 word frequency count on the titles to see what topics are \
                 trending. Modularize the code.",
    },
    Template {
        id: "portfolio",
        name: "Developer Portfolio",
        description: "Personal portfolio site to showcase projects, skills, \
                      and resume.",
        icon: "fa-id-card",
        prompt: "Create a personal developer portfolio website in a single \
                 HTML file. Sections: About Me, Skills (displayed as tags), \
                 Projects Gallery (with hover effects), and a Contact Form. \
                 Use a dark, futuristic theme with custom CSS.",
    },
];

/// Looks a persona up by id, display name or role title.
pub fn find_persona(key: &str) -> Option<&'static Persona> {
    PERSONAS
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(key) || p.answers_to(key))
}

/// Looks an integration up by id or name.
pub fn find_tool(key: &str) -> Option<&'static Tool> {
    TOOLS.iter().find(|t| {
        t.id.eq_ignore_ascii_case(key) || t.name.eq_ignore_ascii_case(key)
    })
}

/// Looks a template up by id.
pub fn find_template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id.eq_ignore_ascii_case(id))
}

/// Composes the behavioral instruction for a new chat session from the
/// given team.
pub fn system_instruction(personas: &[Persona]) -> String {
    let team = personas
        .iter()
        .map(|p| {
            format!(
                "- {} ({}): {} {}",
                p.name, p.role, p.description, p.prompt_snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    include_str!("./system_prompt.md").replace("{{TEAM}}", &team)
}
