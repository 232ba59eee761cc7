//! Terminal front-end for the chat backend: sign up or log in, then chat.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use rag_chat::client::{ApiClient, LoginOutcome};
use rag_chat::models::SignupRequest;
use rag_chat::session::{Session, NO_ANSWER};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let base_url =
        std::env::var("RAG_CHAT_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let client = ApiClient::new(base_url, reqwest::Client::new());

    let mut session = if std::env::var("RAG_CHAT_LOGGED_IN").as_deref() == Ok("true") {
        Session::resumed()
    } else {
        Session::new()
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let keep_going = if session.is_logged_in() {
            chat_turn(&client, &mut session, &mut input).await?
        } else {
            login_screen(&client, &mut session, &mut input).await?
        };
        if !keep_going {
            return Ok(());
        }
    }
}

/// One pass over the login/signup form. Returns `false` on end of input.
async fn login_screen(
    client: &ApiClient,
    session: &mut Session,
    input: &mut Input,
) -> anyhow::Result<bool> {
    let Some(choice) = prompt(input, "Signup or Login? [s/l]").await? else {
        return Ok(false);
    };
    let signup = choice.trim().eq_ignore_ascii_case("s");

    let Some(email) = prompt(input, "Email").await? else {
        return Ok(false);
    };
    let Some(password) = prompt(input, "Password").await? else {
        return Ok(false);
    };
    if email.trim().is_empty() || password.is_empty() {
        println!("Please enter both email and password.");
        return Ok(true);
    }

    if signup {
        let Some(username) = prompt(input, "Username").await? else {
            return Ok(false);
        };
        let Some(birthdate) = prompt(input, "Birth date (MM/DD/YYYY)").await? else {
            return Ok(false);
        };
        if username.trim().is_empty() || birthdate.trim().is_empty() {
            println!("Please fill in all fields for signup.");
            return Ok(true);
        }

        let req = SignupRequest {
            email: Some(email.trim().to_string()),
            password: Some(password),
            username: Some(username),
            birthdate: Some(birthdate),
        };
        match client.signup(&req).await {
            Ok((_, message)) => println!("{message}"),
            Err(e) => println!("Signup failed: {e:#}"),
        }
        return Ok(true);
    }

    match client.login(email.trim(), &password).await {
        Ok(LoginOutcome::LoggedIn(user)) => {
            println!("Login successful! Welcome, {}.", user.username);
            session.log_in(user);
        }
        Ok(LoginOutcome::Rejected(message)) => println!("{message}"),
        Err(e) => println!("Login failed: {e:#}"),
    }
    Ok(true)
}

/// Read one prompt, ask the backend, print the answer.
async fn chat_turn(
    client: &ApiClient,
    session: &mut Session,
    input: &mut Input,
) -> anyhow::Result<bool> {
    let Some(line) = prompt(input, "You").await? else {
        return Ok(false);
    };
    let line = line.trim();
    if line.is_empty() {
        return Ok(true);
    }

    session.push_user(line);
    let answer = match client.query(line).await {
        Ok(resp) => resp.openai_response,
        Err(e) => {
            tracing::warn!("Query failed: {e:#}");
            None
        }
    };
    session.push_assistant(answer);

    let reply = session
        .transcript()
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or(NO_ANSWER);
    println!("Assistant: {reply}\n");
    Ok(true)
}

async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}
