//! Line-oriented terminal front end.
//!
//! The shell owns the mounted `Screen`, reads commands from any async reader and
//! writes plain-text renderings to any async writer, so the binary wires it to
//! stdin/stdout and the tests wire it to byte buffers.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::{
    Portal, Screen,
    forms::{Draft, FieldErrors, FormState, SubmitOutcome},
    views::{FetchState, Notice, events},
};

pub const HELP: &str = "\
commands:
  open <path>      navigate, e.g. open /allprojects, open /event/3
  search <term>    filter the current project or event list
  image <n>        show gallery image n on an event page
  participate      register attendance on an event page
  whoami           show the signed-in user
  logout           end the session
  help             show this help
  quit             leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Search(String),
    Image(usize),
    Participate,
    WhoAmI,
    Logout,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match (head, rest) {
            ("open", "") => return Err("usage: open <path>".to_string()),
            ("open", path) => Command::Open(path.to_string()),
            ("search", term) => Command::Search(term.to_string()),
            ("image", n) => Command::Image(
                n.parse()
                    .map_err(|_| "usage: image <number>".to_string())?,
            ),
            ("participate", "") => Command::Participate,
            ("whoami", "") => Command::WhoAmI,
            ("logout", "") => Command::Logout,
            ("help", "") => Command::Help,
            ("quit" | "exit", "") => Command::Quit,
            _ => return Err(format!("unknown command: {}", line)),
        };
        Ok(Some(command))
    }
}

/// Shell
///
/// Interactive loop over a `Portal`.
pub struct Shell<R, W> {
    portal: Portal,
    screen: Screen,
    input: Lines<R>,
    out: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(portal: Portal, input: R, out: W) -> Self {
        Self {
            portal,
            screen: Screen::Home,
            input: input.lines(),
            out,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Everything written so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// run
    ///
    /// Reads commands until `quit` or end of input.
    pub async fn run(&mut self) -> io::Result<()> {
        self.write(&render(&self.screen)).await?;
        loop {
            self.out.write_all(b"> ").await?;
            self.out.flush().await?;
            let Some(line) = self.input.next_line().await? else {
                break;
            };
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if !self.execute(command).await? {
                        break;
                    }
                }
                Err(message) => self.write(&message).await?,
            }
        }
        self.screen.unmount();
        Ok(())
    }

    /// Runs one command. Returns `false` when input ran out in the middle of a form.
    pub async fn execute(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::Open(path) => return self.open(&path).await,
            Command::Search(term) => match &self.screen {
                Screen::AllProjects(view) => view.set_search(&term),
                Screen::AllEvents(view) => view.set_search(&term),
                _ => return self.write("search works on /allprojects and /allevents").await.map(|_| true),
            },
            Command::Image(index) => {
                let selected = match &self.screen {
                    Screen::Event { view, .. } => view.select_image(index),
                    _ => return self.write("image works on an event page").await.map(|_| true),
                };
                if !selected {
                    self.write("no such image").await?;
                }
            }
            Command::Participate => {
                let notice = match &self.screen {
                    Screen::Event { view, .. } => view.register().await,
                    _ => return self.write("participate works on an event page").await.map(|_| true),
                };
                match notice {
                    Some(Notice::Success(message)) | Some(Notice::Failure(message)) => {
                        self.write(&message).await?
                    }
                    None => self.write("Registering...").await?,
                }
            }
            Command::WhoAmI => {
                let line = match self.portal.session.current() {
                    Some(session) => format!(
                        "{} <{}> ({})",
                        session.user.name, session.user.email, session.user.role
                    ),
                    None => "not signed in".to_string(),
                };
                self.write(&line).await?;
                return Ok(true);
            }
            Command::Logout => {
                if let Err(e) = self.portal.logout() {
                    self.write(&format!("logout failed: {}", e)).await?;
                    return Ok(true);
                }
                return self.open("/").await;
            }
            Command::Help => {
                self.write(HELP).await?;
                return Ok(true);
            }
            Command::Quit => return Ok(true),
        }
        self.write(&render(&self.screen)).await?;
        Ok(true)
    }

    /// open
    ///
    /// Navigates, mounts the screen and runs its on-mount fetch. Forms are filled in
    /// from the following input lines and submitted right away; a successful submit
    /// navigates on to wherever the form points.
    async fn open(&mut self, path: &str) -> io::Result<bool> {
        let mut next = Some(path.to_string());
        while let Some(path) = next.take() {
            let navigation = self.portal.navigate(&path);
            if navigation.was_redirected() {
                self.write(&format!(
                    "redirected: {} -> {}",
                    navigation.requested,
                    navigation.landed_on()
                ))
                .await?;
            }

            self.screen.unmount();
            self.screen = navigation.screen;
            self.screen.activate().await;
            self.write(&render(&self.screen)).await?;

            let mut screen = std::mem::replace(&mut self.screen, Screen::Home);
            let outcome = self.run_form(&mut screen).await;
            self.screen = screen;

            match outcome? {
                FormRun::NotAForm => {}
                FormRun::InputClosed => return Ok(false),
                FormRun::Done(SubmitOutcome::Navigate(route)) => next = Some(route.path()),
                FormRun::Done(_) => self.write(&render(&self.screen)).await?,
            }
        }
        Ok(true)
    }

    async fn run_form(&mut self, screen: &mut Screen) -> io::Result<FormRun> {
        let api = self.portal.api.clone();
        let storage = self.portal.storage().clone();
        let session = self.portal.session.clone();

        let outcome = match screen {
            Screen::Register(form) => {
                if !self.fill(form).await? {
                    return Ok(FormRun::InputClosed);
                }
                form.submit(api.as_ref()).await
            }
            Screen::Login(form) => {
                if !self.fill(form).await? {
                    return Ok(FormRun::InputClosed);
                }
                form.submit(api.as_ref(), &session).await
            }
            Screen::ForgotPassword(form) => {
                if !self.fill(form).await? {
                    return Ok(FormRun::InputClosed);
                }
                form.submit(api.as_ref(), storage.as_ref()).await
            }
            Screen::EnterCode(form) => {
                if !self.fill(form).await? {
                    return Ok(FormRun::InputClosed);
                }
                form.submit(api.as_ref(), storage.as_ref()).await
            }
            Screen::ResetPassword(form) => {
                if !self.fill(form).await? {
                    return Ok(FormRun::InputClosed);
                }
                form.submit(api.as_ref(), storage.as_ref()).await
            }
            _ => return Ok(FormRun::NotAForm),
        };
        Ok(FormRun::Done(outcome))
    }

    /// Prompts for every field of the draft. Returns `false` if input ends first.
    async fn fill<D: Draft>(&mut self, form: &mut FormState<D>) -> io::Result<bool> {
        for field in D::FIELDS {
            self.out
                .write_all(format!("{}: ", label(field)).as_bytes())
                .await?;
            self.out.flush().await?;
            let Some(value) = self.input.next_line().await? else {
                return Ok(false);
            };
            form.set_field(field, value.trim());
        }
        Ok(true)
    }

    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }
}

enum FormRun {
    NotAForm,
    InputClosed,
    Done(SubmitOutcome),
}

/// `password_verify` -> `password verify`
fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// render
///
/// Plain-text rendering of a screen: spinner text while loading, an alert line on
/// failure, the content once loaded.
pub fn render(screen: &Screen) -> String {
    match screen {
        Screen::Home => "Community portal. Type `help` for commands.".to_string(),
        Screen::Register(form) => render_form("Create an account", form.errors(), form.form_error()),
        Screen::Login(form) => render_form("Sign in", form.errors(), form.form_error()),
        Screen::ForgotPassword(form) => {
            render_form("Forgot Password", form.errors(), form.form_error())
        }
        Screen::EnterCode(form) => {
            render_form("Enter Verification Code", form.errors(), form.form_error())
        }
        Screen::ResetPassword(form) => {
            render_form("Set New Password", form.errors(), form.form_error())
        }
        Screen::AllProjects(view) => render_fetch(&view.state(), |_| {
            let lines: Vec<String> = view
                .visible()
                .iter()
                .map(|p| format!("[{}] {} - {}", p.id, p.name, p.short_info))
                .collect();
            with_empty(lines, "No projects found")
        }),
        Screen::AllEvents(view) => render_fetch(&view.state(), |_| {
            let lines: Vec<String> = view
                .visible()
                .iter()
                .map(|e| {
                    let date = e.start_date.as_ref().map(events::format_date).unwrap_or_default();
                    format!("[{}] {} - {} {}", e.id, e.name, e.city, date)
                })
                .collect();
            with_empty(lines, "No events found")
        }),
        Screen::Project { view, .. } => render_fetch(&view.state(), |project| {
            let mut lines = vec![
                project.name.clone(),
                format!("Category: {}", project.category),
                format!("Location: {}, {}", project.city, project.street),
            ];
            if let Some(owner) = &project.owner {
                lines.push(format!("By {}", owner.user.full_name()));
            }
            lines.push(project.description.clone());
            if let Some(contact) = &project.contact {
                if let Some(email) = &contact.email {
                    lines.push(format!("Email: {}", email));
                }
                if let Some(phone) = contact.phones.first() {
                    lines.push(format!("Phone: {}", phone));
                }
                if let Some(website) = &contact.website {
                    lines.push(format!("Website: {}", website));
                }
                for page in &contact.pages {
                    lines.push(format!("{}: {}", page.page_type, page.page_url));
                }
            }
            if project.images.is_empty() {
                lines.push("No images available".to_string());
            }
            lines.join("\n")
        }),
        Screen::Event { view, .. } => render_fetch(&view.state(), |event| {
            let mut lines = vec![
                event.name.clone(),
                format!("Category: {}", event.category),
                format!("{} - {}", event.city, event.street),
            ];
            if let (Some(start), Some(end)) = (&event.start_date, &event.end_date) {
                lines.push(events::format_date(start));
                lines.push(format!(
                    "{} - {}",
                    events::format_time(start),
                    events::format_time(end)
                ));
            }
            if let Some(image) = event.images.get(view.selected_image()) {
                lines.push(format!("Image: {}", image.image_url));
            }
            lines.push(format!("Status: {}", event.status_label()));
            match view.participation() {
                Some(p) if p.participating => lines.push("You are registered".to_string()),
                _ if view.is_registering() => lines.push("Registering...".to_string()),
                _ => lines.push("Type `participate` to register attendance".to_string()),
            }
            lines.join("\n")
        }),
        Screen::Owner { view, .. } => render_fetch(&view.state(), |profile| {
            let mut lines = vec![profile.user.full_name()];
            if let Some(age) = view.age() {
                lines.push(format!("Age: {}", age));
            }
            lines.push(profile.bio.clone());
            lines.join("\n")
        }),
        Screen::Profile(Some(session)) => format!(
            "{}\n{}\nrole: {}",
            session.user.name, session.user.email, session.user.role
        ),
        Screen::Profile(None) => "not signed in".to_string(),
        Screen::NotFound(path) => format!("Page not found: {}", path),
    }
}

fn render_fetch<T>(state: &FetchState<T>, loaded: impl FnOnce(&T) -> String) -> String {
    match state {
        FetchState::Loading => "Loading...".to_string(),
        FetchState::Failed(message) => format!("! {}", message),
        FetchState::Loaded(data) => loaded(data),
    }
}

fn render_form(title: &str, errors: &FieldErrors, form_error: Option<&str>) -> String {
    let mut lines = vec![title.to_string()];
    if let Some(message) = form_error {
        lines.push(format!("! {}", message));
    }
    for (field, message) in errors {
        lines.push(format!("  {}: {}", label(field), message));
    }
    lines.join("\n")
}

fn with_empty(lines: Vec<String>, empty: &str) -> String {
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}
