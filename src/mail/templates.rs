//! Email templates for magic-link sign in.

use super::EmailMessage;

/// Content of the sign-in email.
pub struct MagicLinkEmail;

impl MagicLinkEmail {
    /// Build the message carrying `link` for `to`.
    pub fn build(to: &str, link: &str, valid_minutes: i64) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            body_text: Self::text_template(to, link, valid_minutes),
            body_html: Self::html_template(to, link, valid_minutes),
        }
    }

    fn text_template(to: &str, link: &str, valid_minutes: i64) -> String {
        format!(
            r#"Hi {},

Open the link below to sign in:

{}

This link expires in {} minutes and can only be used once.

If you didn't request this email, you can ignore it."#,
            to, link, valid_minutes
        )
    }

    fn html_template(to: &str, link: &str, valid_minutes: i64) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body>
    <p><strong>Hi {},</strong></p>
    <p>Open the link below to sign in.</p>
    <p>
        <a style="background-color:#0084C8; color:white; padding:10px 20px; border-radius:30px; text-align:center; text-decoration:none" href="{}">
            Verify Email
        </a>
    </p>
    <p style="color:#666; font-size:14px">This link expires in {} minutes and can only be used once.</p>
</body>
</html>"#,
            to, link, valid_minutes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_bodies_carry_the_link() {
        let link = "http://localhost:3001/auth/magic-link?token=abc.def.ghi";
        let message = MagicLinkEmail::build("barista@example.com", link, 5);

        assert_eq!(message.to, "barista@example.com");
        assert!(message.body_text.contains(link));
        assert!(message.body_html.contains(&format!("href=\"{}\"", link)));
        assert!(message.body_text.contains("5 minutes"));
    }
}
